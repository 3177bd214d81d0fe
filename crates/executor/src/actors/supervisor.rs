use std::{collections::HashMap, time::Duration};

use common::actors::{Actor, ActorType, ControlMessage};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{error, info, warn};
use uuid::Uuid;

type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

/// Restarts unresponsive monitor actors and fans a ctrl-c out to them as a
/// shutdown signal that interrupts their inter-tick sleep.
pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    ids: HashMap<Uuid, ActorType>,
    shutdown_tx: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            actor_factories: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            ids: HashMap::new(),
            shutdown_tx,
        }
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    pub async fn start(&mut self) {
        let mut check_interval = time::interval(Duration::from_secs(1));
        let timeout_duration = Duration::from_secs(3);

        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        for actor in actors {
            self.spawn_actor(actor, supervisor_tx.clone());
        }

        let mut shutting_down = false;

        loop {
            tokio::select! {
                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(&actor_type) = self.ids.get(&id) {
                                self.pulses.insert(actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            if let Some(actor_type) = self.ids.remove(&id) {
                                warn!("{:?} is shutting down gracefully.", actor_type);
                                self.pulses.remove(&actor_type);
                                if let Some(handle) = self.handles.remove(&actor_type) {
                                    handle.abort();
                                }
                            }
                            if shutting_down && self.handles.is_empty() {
                                break;
                            }
                        }
                        ControlMessage::Error(id, error_msg) => {
                            if let Some(&actor_type) = self.ids.get(&id) {
                                error!("Actor {:?} reported error: {}", actor_type, error_msg);
                                self.pulses.insert(actor_type, Instant::now());
                            }
                        }
                    }
                }

                _ = tokio::signal::ctrl_c(), if !shutting_down => {
                    info!("Shutdown requested, signalling monitors...");
                    shutting_down = true;
                    let _ = self.shutdown_tx.send(true);
                    if self.handles.is_empty() {
                        break;
                    }
                }

                _ = check_interval.tick() => {
                    if shutting_down {
                        continue;
                    }
                    let dead_timeout = Instant::now() - timeout_duration;

                    let mut dead_actors = Vec::new();
                    for (&actor_type, &pulse) in self.pulses.iter() {
                        if pulse < dead_timeout {
                            warn!("{:?} is unresponsive!", actor_type);
                            dead_actors.push(actor_type);
                            self.handles[&actor_type].abort();
                        }
                    }

                    for actor_type in dead_actors {
                        self.spawn_actor(actor_type, supervisor_tx.clone());
                    }
                }
            }
        }
        info!("Supervisor stopped.");
    }

    fn spawn_actor(&mut self, actor_type: ActorType, tx: mpsc::Sender<ControlMessage>) {
        let mut new_actor = self.actor_factories[&actor_type]();
        self.ids.retain(|_, t| *t != actor_type);
        self.ids.insert(new_actor.id(), actor_type);

        let handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx).await {
                error!("Actor {:?} crashed: {}", &actor_type, e);
            }
        });
        self.handles.insert(actor_type, handle);
        self.pulses.insert(actor_type, Instant::now());
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
