// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with collective operations between workers.

use thiserror::Error;

use crate::events::EventListError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectiveError {
    #[error("Worker {rank} left the group before a collective operation completed")]
    Disconnected { rank: usize },

    #[error("Worker {rank} sent a message for a different collective operation")]
    UnexpectedMessage { rank: usize },

    #[error("Worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("Couldn't combine the events of all workers: {0}")]
    Events(#[from] EventListError),
}
