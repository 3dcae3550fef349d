#![allow(dead_code)]

use dom::{Document, NodeKey};
use observer::{Delivery, MutationObserver, MutationRecord, ObserverSettings};
use std::cell::RefCell;
use std::rc::Rc;

/// Batches delivered so far, one entry per subscriber call.
#[derive(Clone, Default)]
pub struct Batches(Rc<RefCell<Vec<Vec<MutationRecord<NodeKey>>>>>);

impl Batches {
    pub fn calls(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn all(&self) -> Vec<MutationRecord<NodeKey>> {
        self.0.borrow().iter().flatten().cloned().collect()
    }

    pub fn last(&self) -> Vec<MutationRecord<NodeKey>> {
        self.0.borrow().last().cloned().unwrap_or_default()
    }

    fn push(&self, records: &[MutationRecord<NodeKey>]) {
        self.0.borrow_mut().push(records.to_vec());
    }
}

/// Observer whose shared subscriber appends each batch to the returned log.
pub fn recording_observer() -> (MutationObserver<Document>, Batches) {
    recording_observer_with(ObserverSettings::default())
}

pub fn recording_observer_with(
    settings: ObserverSettings,
) -> (MutationObserver<Document>, Batches) {
    let batches = Batches::default();
    let sink = batches.clone();
    let observer = MutationObserver::with_settings(
        settings,
        move |records: &[MutationRecord<NodeKey>], _: &mut Delivery<'_, Document>| {
            sink.push(records);
            Ok(())
        },
    );
    (observer, batches)
}

/// Subscriber for `MutationObserver::register` that records into `batches`.
pub fn recorder(
    batches: &Batches,
) -> impl FnMut(&[MutationRecord<NodeKey>], &mut Delivery<'_, Document>) -> Result<(), observer::SubscriberError>
+ 'static {
    let sink = batches.clone();
    move |records: &[MutationRecord<NodeKey>], _: &mut Delivery<'_, Document>| {
        sink.push(records);
        Ok(())
    }
}
