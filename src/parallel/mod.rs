// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Cooperating workers.

Projection is data parallel: every worker owns a partition of a photon sample
and runs the whole pipeline on it alone. Workers only meet at two collective
operations, a sum of the number of photons to use and the final gather of
events. Both block until every worker of the group arrives.

A [`Communicator`] is a worker's handle on its group. [`SingleProcess`] is a
group of one; [`thread_group`] makes a group of in-process threads that talk
over channels, with rank 0 as the root.
 */

mod error;

pub use error::CollectiveError;

use std::{num::NonZeroUsize, thread};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    events::{EventColumns, EventList},
    photons::PhotonSample,
    project::{project_photons, ProjectionError, ProjectionParams},
};

pub trait Communicator {
    /// This worker's index in its group. Rank 0 is the root.
    fn rank(&self) -> usize;

    /// The number of workers in the group.
    fn size(&self) -> usize;

    /// Sum `value` over all workers. Every worker gets the total.
    fn all_reduce_sum(&self, value: usize) -> Result<usize, CollectiveError>;

    /// Concatenate the events of all workers in rank order. Every worker gets
    /// the concatenation.
    fn gather_events(&self, local: EventColumns) -> Result<EventColumns, CollectiveError>;
}

/// A group with one worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, value: usize) -> Result<usize, CollectiveError> {
        Ok(value)
    }

    fn gather_events(&self, local: EventColumns) -> Result<EventColumns, CollectiveError> {
        Ok(local)
    }
}

#[derive(Debug, Clone)]
enum Message {
    Count(usize),
    Events(EventColumns),
}

#[derive(Debug)]
enum Link {
    /// The root has a channel to and from every other worker, indexed by
    /// `rank - 1`.
    Root {
        from_workers: Vec<Receiver<Message>>,
        to_workers: Vec<Sender<Message>>,
    },

    Worker {
        to_root: Sender<Message>,
        from_root: Receiver<Message>,
    },
}

/// A worker of a group made by [`thread_group`]. If a worker is dropped
/// before reaching a collective operation, the others get
/// [`CollectiveError::Disconnected`] instead of waiting forever.
#[derive(Debug)]
pub struct ThreadCommunicator {
    rank: usize,
    size: usize,
    link: Link,
}

/// Make the communicators of a group of `size` workers, in rank order.
pub fn thread_group(size: NonZeroUsize) -> Vec<ThreadCommunicator> {
    let size = size.get();
    let mut from_workers = Vec::with_capacity(size - 1);
    let mut to_workers = Vec::with_capacity(size - 1);
    let mut workers = Vec::with_capacity(size - 1);
    for rank in 1..size {
        let (tx_up, rx_up) = unbounded();
        let (tx_down, rx_down) = unbounded();
        from_workers.push(rx_up);
        to_workers.push(tx_down);
        workers.push(ThreadCommunicator {
            rank,
            size,
            link: Link::Worker {
                to_root: tx_up,
                from_root: rx_down,
            },
        });
    }

    let mut group = Vec::with_capacity(size);
    group.push(ThreadCommunicator {
        rank: 0,
        size,
        link: Link::Root {
            from_workers,
            to_workers,
        },
    });
    group.extend(workers);
    group
}

impl ThreadCommunicator {
    /// Send `local` to the root, which combines every worker's message (in
    /// rank order) and sends the result back to all.
    fn all_gather<F>(&self, local: Message, combine: F) -> Result<Message, CollectiveError>
    where
        F: FnOnce(Vec<Message>) -> Result<Message, CollectiveError>,
    {
        match &self.link {
            Link::Root {
                from_workers,
                to_workers,
            } => {
                let mut messages = Vec::with_capacity(self.size);
                messages.push(local);
                for (i, rx) in from_workers.iter().enumerate() {
                    let message = rx
                        .recv()
                        .map_err(|_| CollectiveError::Disconnected { rank: i + 1 })?;
                    messages.push(message);
                }
                let result = combine(messages)?;
                for (i, tx) in to_workers.iter().enumerate() {
                    tx.send(result.clone())
                        .map_err(|_| CollectiveError::Disconnected { rank: i + 1 })?;
                }
                Ok(result)
            }

            Link::Worker { to_root, from_root } => {
                to_root
                    .send(local)
                    .map_err(|_| CollectiveError::Disconnected { rank: 0 })?;
                from_root
                    .recv()
                    .map_err(|_| CollectiveError::Disconnected { rank: 0 })
            }
        }
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&self, value: usize) -> Result<usize, CollectiveError> {
        let total = self.all_gather(Message::Count(value), |messages| {
            let mut total = 0;
            for (rank, message) in messages.into_iter().enumerate() {
                match message {
                    Message::Count(c) => total += c,
                    Message::Events(_) => return Err(CollectiveError::UnexpectedMessage { rank }),
                }
            }
            Ok(Message::Count(total))
        })?;
        match total {
            Message::Count(total) => Ok(total),
            Message::Events(_) => Err(CollectiveError::UnexpectedMessage { rank: 0 }),
        }
    }

    fn gather_events(&self, local: EventColumns) -> Result<EventColumns, CollectiveError> {
        let all = self.all_gather(Message::Events(local), |messages| {
            let mut all = EventColumns::default();
            for (rank, message) in messages.into_iter().enumerate() {
                match message {
                    Message::Events(events) if rank == 0 => all = events,
                    Message::Events(events) => all.append(&events)?,
                    Message::Count(_) => return Err(CollectiveError::UnexpectedMessage { rank }),
                }
            }
            Ok(Message::Events(all))
        })?;
        match all {
            Message::Events(all) => Ok(all),
            Message::Count(_) => Err(CollectiveError::UnexpectedMessage { rank: 0 }),
        }
    }
}

/// Run `work` once per communicator, each on its own named thread, and
/// collect the results in rank order.
pub fn run_workers<T, E, F>(
    communicators: Vec<ThreadCommunicator>,
    work: F,
) -> Vec<Result<T, E>>
where
    T: Send,
    E: Send + From<CollectiveError>,
    F: Fn(ThreadCommunicator) -> Result<T, E> + Sync,
{
    thread::scope(|scope| {
        let handles: Vec<_> = communicators
            .into_iter()
            .map(|comm| {
                let rank = comm.rank();
                let work = &work;
                let handle = thread::Builder::new()
                    .name(format!("worker {rank}"))
                    .spawn_scoped(scope, move || work(comm))
                    .expect("OS can create threads");
                (rank, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(CollectiveError::WorkerPanicked { rank }.into()))
            })
            .collect()
    })
}

/// Project a photon sample with `num_workers` threads. The sample is split
/// into contiguous partitions, one per worker, and worker `r` draws its random
/// numbers from a generator seeded with `seed + r`. The events of all workers
/// are gathered into one event list.
pub fn project_photons_parallel(
    sample: &PhotonSample,
    params: &ProjectionParams,
    num_workers: NonZeroUsize,
    seed: u64,
) -> Result<EventList, ProjectionError> {
    debug!("Projecting photons with {num_workers} workers");
    let results = run_workers(thread_group(num_workers), |comm| {
        let partition = sample.partition(comm.rank(), num_workers)?;
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(comm.rank() as u64));
        project_photons(&partition, params, &comm, &mut rng)
    });

    let mut events = None;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(e) => {
                events.get_or_insert(e);
            }
            Err(e) => errors.push(e),
        }
    }

    // A worker that fails on its own leaves its peers with disconnections;
    // report the original failure.
    let is_disconnection = |e: &ProjectionError| {
        matches!(
            e,
            ProjectionError::Collective(CollectiveError::Disconnected { .. })
        )
    };
    if let Some(i) = errors.iter().position(|e| !is_disconnection(e)) {
        return Err(errors.swap_remove(i));
    }
    if let Some(e) = errors.into_iter().next() {
        return Err(e);
    }
    // Every worker holds the same events.
    events.ok_or(ProjectionError::Collective(CollectiveError::Disconnected {
        rank: 0,
    }))
}
