//! Registration entry point: mode validation and the actor thread that owns
//! the placement engine.

use std::sync::Arc;
use std::thread;

use flume::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::{NodeId, Scope};
use crate::engine::{Config, ParentAssignment, PlacementEngine};
use crate::error::{PlacementError, RegistryError};
use crate::store::{NodeStore, RunNumberAuthority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// How a registrant names their invitor.
pub enum RegistrationMode {
    /// No invitor: the search starts at the system root.
    Nic,
    /// Caller-supplied invitor; must resolve to a known node.
    Bic { invitor: NodeId },
}

#[derive(Debug, Clone, Default)]
/// Builds a [Registry] and spawns its actor thread.
pub struct RegistryBuilder {
    config: Config,
    network_fallback: bool,
}

impl RegistryBuilder {
    /// Placement engine configurations.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Retry a FILE-scoped registration with NETWORK scope when the file is
    /// exhausted. The engine itself never escalates; widening the search is
    /// this caller-level policy, and it defaults to off.
    pub fn network_fallback(mut self, network_fallback: bool) -> Self {
        self.network_fallback = network_fallback;
        self
    }

    pub fn build(
        &self,
        store: Arc<dyn NodeStore>,
        runs: Arc<dyn RunNumberAuthority>,
    ) -> Registry {
        let engine = PlacementEngine::new(store, runs).with_config(self.config.clone());

        let (sender, receiver) = flume::bounded(32);

        let actor = Actor {
            engine,
            network_fallback: self.network_fallback,
        };

        thread::spawn(move || actor.run(receiver));

        Registry { sender }
    }
}

#[derive(Debug, Clone)]
/// Cloneable handle to the registration actor.
///
/// The actor thread owns the engine and serializes registrations; it shuts
/// down after the last handle is dropped.
pub struct Registry {
    sender: Sender<ActorMessage>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    // === Public Methods ===

    /// Register a new member and place them in the tree.
    ///
    /// Validates the mode, resolves the invitor, and hands the placement to
    /// the engine. Never partially applied: on any error the tree is
    /// untouched.
    pub fn register(
        &self,
        mode: RegistrationMode,
        scope: Scope,
    ) -> Result<ParentAssignment, RegistryError> {
        let (sender, receiver) = flume::bounded::<Result<ParentAssignment, PlacementError>>(1);

        self.sender
            .send(ActorMessage::Register(mode, scope, sender))
            .map_err(|_| RegistryError::RegistryWasShutdown)?;

        let assignment = receiver
            .recv()
            .map_err(|_| RegistryError::RegistryWasShutdown)??;

        Ok(assignment)
    }

    /// A snapshot of general information about the tree.
    pub fn info(&self) -> Result<Info, RegistryError> {
        let (sender, receiver) = flume::bounded::<Info>(1);

        self.sender
            .send(ActorMessage::Info(sender))
            .map_err(|_| RegistryError::RegistryWasShutdown)?;

        receiver.recv().map_err(|_| RegistryError::RegistryWasShutdown)
    }

    /// Shut the actor thread down and wait for in-flight registrations to
    /// drain.
    pub fn shutdown(&self) {
        let (sender, receiver) = flume::bounded::<()>(1);

        let _ = self.sender.send(ActorMessage::Shutdown(sender));
        let _ = receiver.recv();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// General information about the placement tree.
pub struct Info {
    pub root_id: NodeId,
    pub node_count: usize,
}

enum ActorMessage {
    Register(
        RegistrationMode,
        Scope,
        Sender<Result<ParentAssignment, PlacementError>>,
    ),
    Info(Sender<Info>),
    Shutdown(Sender<()>),
}

struct Actor {
    engine: PlacementEngine,
    network_fallback: bool,
}

impl Actor {
    fn run(self, receiver: Receiver<ActorMessage>) {
        let root = self.engine.store().root_id();
        info!(?root, "Registry actor started");

        while let Ok(message) = receiver.recv() {
            match message {
                ActorMessage::Register(mode, scope, sender) => {
                    let _ = sender.send(self.register(mode, scope));
                }
                ActorMessage::Info(sender) => {
                    let _ = sender.send(Info {
                        root_id: self.engine.store().root_id(),
                        node_count: self.engine.store().node_count(),
                    });
                }
                ActorMessage::Shutdown(sender) => {
                    let _ = sender.send(());
                    break;
                }
            }
        }

        debug!("Registry actor thread was shutdown after Drop");
    }

    fn register(
        &self,
        mode: RegistrationMode,
        scope: Scope,
    ) -> Result<ParentAssignment, PlacementError> {
        let invitor = self.resolve_invitor(mode)?;

        match self.engine.allocate_parent(invitor, scope) {
            Err(PlacementError::NoOpenParent(Scope::File)) if self.network_fallback => {
                debug!(?invitor, "File exhausted, widening to network scope");
                self.engine.allocate_parent(invitor, Scope::Network)
            }
            result => result,
        }
    }

    fn resolve_invitor(&self, mode: RegistrationMode) -> Result<NodeId, PlacementError> {
        match mode {
            RegistrationMode::Nic => Ok(self.engine.store().root_id()),
            RegistrationMode::Bic { invitor } => self
                .engine
                .store()
                .get_node(invitor)
                .map(|node| node.id)
                .ok_or(PlacementError::InvalidInvitor(invitor)),
        }
    }
}
