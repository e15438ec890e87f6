use std::ops::{Deref, DerefMut};

use anyhow::{Context, Result};
use engine::{StateRecord, TransitionModel};
use log::error;

/// Exclusive access to a transition model that is rolled back when the guard goes away.
///
/// `restore` reports a failed rollback; dropping the guard still restores but can only log.
pub struct Checkpoint<'a, M: TransitionModel> {
    model: &'a mut M,
    record: Option<StateRecord<M::State, M::Action>>,
}

impl<'a, M: TransitionModel> Checkpoint<'a, M> {
    pub fn new(model: &'a mut M) -> Self {
        let record = model.backup();

        Self {
            model,
            record: Some(record),
        }
    }

    pub fn restore(mut self) -> Result<()> {
        match self.record.take() {
            Some(record) => self
                .model
                .load(&record)
                .context("Failed to restore the transition model"),
            None => Ok(()),
        }
    }
}

impl<'a, M: TransitionModel> Deref for Checkpoint<'a, M> {
    type Target = M;

    fn deref(&self) -> &M {
        &*self.model
    }
}

impl<'a, M: TransitionModel> DerefMut for Checkpoint<'a, M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut *self.model
    }
}

impl<'a, M: TransitionModel> Drop for Checkpoint<'a, M> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            if let Err(err) = self.model.load(&record) {
                error!("Failed to restore the transition model: {:?}", err);
            }
        }
    }
}
