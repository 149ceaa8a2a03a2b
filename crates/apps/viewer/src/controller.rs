//! Turns host events into render cycles.
//!
//! Must run inside a `tokio::task::LocalSet`: cycles are spawned as local
//! tasks so several may be waiting on their fetch at once.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::{GeoBounds, LatLng};
use layers::MapHost;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cycle::{RenderCycle, perform_render_cycle, search_location};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The viewport settled after a pan or zoom.
    Idle,
    CategoryChanged(String),
    SearchLocation(String),
}

pub struct ViewportController<H: MapHost> {
    cycle: Rc<RefCell<RenderCycle<H>>>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    tasks: Vec<JoinHandle<()>>,
    cycles_spawned: usize,
}

impl<H: MapHost + Clone + 'static> ViewportController<H> {
    /// Creates the controller and the sender hosts report events through.
    ///
    /// An initial `Idle` is queued for the first load.
    pub fn new(cycle: Rc<RefCell<RenderCycle<H>>>) -> (Self, mpsc::UnboundedSender<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(HostEvent::Idle);
        let controller = Self {
            cycle,
            events: rx,
            tasks: Vec::new(),
            cycles_spawned: 0,
        };
        (controller, tx)
    }

    pub fn render_cycle(&self) -> &Rc<RefCell<RenderCycle<H>>> {
        &self.cycle
    }

    pub fn cycles_spawned(&self) -> usize {
        self.cycles_spawned
    }

    pub fn current_bounds(&self) -> Option<GeoBounds> {
        self.cycle
            .borrow()
            .context()
            .host()
            .viewport()
            .map(|vp| vp.bounds)
    }

    pub fn center(&self) -> Option<LatLng> {
        self.cycle
            .borrow()
            .context()
            .host()
            .viewport()
            .map(|vp| vp.center)
    }

    fn dispatch(&mut self, event: HostEvent) {
        debug!(?event, "host event");
        match event {
            HostEvent::Idle => self.spawn_cycle(),
            HostEvent::CategoryChanged(category) => {
                self.cycle.borrow_mut().set_category(category);
                self.spawn_cycle();
            }
            HostEvent::SearchLocation(address) => {
                let cycle = self.cycle.clone();
                self.tasks.push(tokio::task::spawn_local(async move {
                    let _ = search_location(cycle, address).await;
                }));
            }
        }
    }

    fn spawn_cycle(&mut self) {
        self.cycles_spawned += 1;
        let cycle = self.cycle.clone();
        self.tasks.push(tokio::task::spawn_local(async move {
            perform_render_cycle(cycle).await;
        }));
    }

    async fn join_tasks(&mut self) {
        for task in std::mem::take(&mut self.tasks) {
            if let Err(err) = task.await {
                warn!(error = %err, "render task failed");
            }
        }
    }

    /// Handles queued events until the queue is empty and every spawned task
    /// has finished. Events sent by those tasks (a pan after a search) are
    /// handled too.
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            while let Ok(event) = self.events.try_recv() {
                self.dispatch(event);
                handled += 1;
            }
            if self.tasks.is_empty() {
                return handled;
            }
            self.join_tasks().await;
        }
    }

    /// Handles events until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.dispatch(event);
            self.tasks.retain(|t| !t.is_finished());
        }
        self.join_tasks().await;
    }
}
