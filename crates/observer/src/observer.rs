//! The observer facade: registry, scheduler and identity table behind one
//! `MutationObserver`.
//!
//! Per tick, for each watch in registration order: diff, re-snapshot if the
//! diff produced records, then hand the batch to the subscriber. Subscribers
//! may edit the tree and queue registry commands through [`Delivery`]; both
//! are only observed from the next tick on.

use crate::config::ObserveConfig;
use crate::error::{ObserverError, SubscriberError};
use crate::host::ObservedTree;
use crate::identity::IdentityTable;
use crate::record::MutationRecord;
use crate::registry::{Registry, Route};
use crate::scheduler::Scheduler;
use crate::settings::ObserverSettings;
use core_types::WatchHandle;
use std::time::Instant;

pub type Subscriber<T> = Box<
    dyn FnMut(
        &[MutationRecord<<T as ObservedTree>::Node>],
        &mut Delivery<'_, T>,
    ) -> Result<(), SubscriberError>,
>;

/// Registry change requested from inside a subscriber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObserverCommand<N> {
    Observe { root: N, config: ObserveConfig },
    Unregister(WatchHandle),
    Disconnect,
}

/// What a subscriber gets alongside its batch.
pub struct Delivery<'d, T: ObservedTree> {
    tree: &'d mut T,
    handle: WatchHandle,
    commands: &'d mut Vec<ObserverCommand<T::Node>>,
}

impl<T: ObservedTree> Delivery<'_, T> {
    /// Watch that produced this batch.
    pub fn handle(&self) -> WatchHandle {
        self.handle
    }

    pub fn tree(&self) -> &T {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut *self.tree
    }

    pub fn observe(&mut self, root: T::Node, config: ObserveConfig) {
        self.commands.push(ObserverCommand::Observe { root, config });
    }

    pub fn unregister(&mut self, handle: WatchHandle) {
        self.commands.push(ObserverCommand::Unregister(handle));
    }

    pub fn disconnect(&mut self) {
        self.commands.push(ObserverCommand::Disconnect);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Watches diffed this tick.
    pub entries: usize,
    pub records: usize,
    /// Subscriber invocations.
    pub deliveries: usize,
}

pub struct MutationObserver<T: ObservedTree> {
    registry: Registry<T>,
    scheduler: Scheduler,
    identity: IdentityTable<T::Node>,
    subscriber: Subscriber<T>,
    settings: ObserverSettings,
}

impl<T: ObservedTree> MutationObserver<T> {
    pub fn new<F>(subscriber: F) -> Self
    where
        F: FnMut(&[MutationRecord<T::Node>], &mut Delivery<'_, T>) -> Result<(), SubscriberError>
            + 'static,
    {
        Self::with_settings(ObserverSettings::default(), subscriber)
    }

    pub fn with_settings<F>(settings: ObserverSettings, subscriber: F) -> Self
    where
        F: FnMut(&[MutationRecord<T::Node>], &mut Delivery<'_, T>) -> Result<(), SubscriberError>
            + 'static,
    {
        Self {
            registry: Registry::new(),
            scheduler: Scheduler::new(settings.period()),
            identity: IdentityTable::new(),
            subscriber: Box::new(subscriber),
            settings,
        }
    }

    /// Watch `root`, delivering to the observer's own subscriber.
    pub fn observe(&mut self, tree: &T, root: T::Node, config: ObserveConfig) -> WatchHandle {
        self.add(tree, root, config, Route::Shared)
    }

    /// Watch `root` with a dedicated subscriber.
    pub fn register<F>(
        &mut self,
        tree: &T,
        root: T::Node,
        config: ObserveConfig,
        subscriber: F,
    ) -> WatchHandle
    where
        F: FnMut(&[MutationRecord<T::Node>], &mut Delivery<'_, T>) -> Result<(), SubscriberError>
            + 'static,
    {
        self.add(tree, root, config, Route::Own(Box::new(subscriber)))
    }

    fn add(&mut self, tree: &T, root: T::Node, config: ObserveConfig, route: Route<T>) -> WatchHandle {
        let handle = self
            .registry
            .register(tree, root, config, route, &mut self.identity);
        self.scheduler.start(Instant::now());
        handle
    }

    pub fn unregister(&mut self, handle: WatchHandle) -> bool {
        let removed = self.registry.unregister(handle);
        if self.registry.is_empty() {
            self.scheduler.stop();
        }
        removed
    }

    /// Drop every watch and halt the scheduler.
    pub fn disconnect(&mut self) {
        self.registry.clear();
        self.scheduler.stop();
        log::debug!(target: "observer.registry", "disconnected");
    }

    pub fn is_observing(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn identity(&self) -> &IdentityTable<T::Node> {
        &self.identity
    }

    pub fn settings(&self) -> &ObserverSettings {
        &self.settings
    }

    /// Diff every watch now and return the records without notifying anyone.
    ///
    /// Changed watches are re-snapshotted, so the next tick does not report
    /// the same changes again. Watches whose root is gone are retired here as
    /// they would be by a tick.
    pub fn take_records(&mut self, tree: &T) -> Vec<MutationRecord<T::Node>> {
        let mut records = Vec::new();
        let mut retired = Vec::new();
        for entry in self.registry.entries_mut() {
            if tree.contains(entry.root()) {
                records.extend(entry.collect(tree, &mut self.identity));
            } else {
                retired.push(entry.handle());
            }
        }
        self.retire(retired);
        if !records.is_empty() {
            self.identity.retain_live(tree);
        }
        if self.registry.is_empty() {
            self.scheduler.stop();
        }
        records
    }

    /// Run a tick if the scheduler is due at `now`.
    pub fn poll(&mut self, tree: &mut T, now: Instant) -> Result<Option<TickReport>, ObserverError> {
        if !self.scheduler.is_due(now) {
            return Ok(None);
        }
        self.scheduler.fire(now);
        self.tick(tree).map(Some)
    }

    /// Sleep until the next tick is due, then run it. Returns `Ok(None)` when
    /// the scheduler is stopped.
    pub fn poll_blocking(&mut self, tree: &mut T) -> Result<Option<TickReport>, ObserverError> {
        let Some(due) = self.scheduler.next_due() else {
            return Ok(None);
        };
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        self.poll(tree, Instant::now().max(due))
    }

    /// One diff-and-deliver pass over every watch, regardless of the schedule.
    ///
    /// A failing subscriber ends the pass early; its error is returned and the
    /// watches after it keep their snapshots for the next tick.
    pub fn tick(&mut self, tree: &mut T) -> Result<TickReport, ObserverError> {
        let mut report = TickReport::default();
        let mut commands = Vec::new();
        let mut retired = Vec::new();
        let mut outcome = Ok(());
        let log_records = self.settings.log_records;

        for entry in self.registry.entries_mut() {
            if !tree.contains(entry.root()) {
                retired.push(entry.handle());
                continue;
            }
            report.entries += 1;
            let records = entry.collect(&*tree, &mut self.identity);
            if records.is_empty() {
                continue;
            }
            let handle = entry.handle();
            report.records += records.len();
            report.deliveries += 1;
            if log_records {
                for record in &records {
                    log::trace!(target: "observer.deliver", "watch {}: {record:?}", handle.0);
                }
            }
            let mut delivery = Delivery {
                tree: &mut *tree,
                handle,
                commands: &mut commands,
            };
            let delivered = match &mut entry.route {
                Route::Shared => (self.subscriber)(&records, &mut delivery),
                Route::Own(subscriber) => subscriber(&records, &mut delivery),
            };
            if let Err(source) = delivered {
                log::debug!(
                    target: "observer.scheduler",
                    "subscriber for watch {} failed; ending tick early",
                    handle.0
                );
                outcome = Err(ObserverError::Subscriber { handle, source });
                break;
            }
        }

        self.retire(retired);
        if report.records > 0 {
            self.identity.retain_live(&*tree);
        }
        self.apply(&*tree, commands);
        if self.registry.is_empty() {
            self.scheduler.stop();
        }
        log::trace!(
            target: "observer.scheduler",
            "tick: {} watches, {} records, {} deliveries",
            report.entries,
            report.records,
            report.deliveries
        );
        outcome.map(|()| report)
    }

    fn retire(&mut self, retired: Vec<WatchHandle>) {
        for handle in retired {
            log::debug!(
                target: "observer.registry",
                "watch {} retired: root no longer exists",
                handle.0
            );
            self.registry.unregister(handle);
        }
    }

    fn apply(&mut self, tree: &T, commands: Vec<ObserverCommand<T::Node>>) {
        for command in commands {
            match command {
                ObserverCommand::Observe { root, config } => {
                    self.observe(tree, root, config);
                }
                ObserverCommand::Unregister(handle) => {
                    self.unregister(handle);
                }
                ObserverCommand::Disconnect => self.disconnect(),
            }
        }
    }
}
