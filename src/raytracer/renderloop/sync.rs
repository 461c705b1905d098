//! Tile distribution and the two-phase pass barrier shared by every render worker.
//!
//! A pass looks like this from a worker's point of view:
//!
//! ```text
//! pre_render_sync ─► next_tile* ─► post_render_sync ─► (leader) finalize + reset_tiles
//! ```
//!
//! The pre-pass barrier cannot release until the leader has finished the previous pass's
//! finalize and arrived, so no worker claims a tile of pass `k + 1` while pass `k` is
//! still being scaled. The post-pass barrier guarantees every pixel write of pass `k` is
//! done before the leader touches the whole buffer.

use super::tile::{build_tiles, Tile};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

/// How a worker left a barrier wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Crossing {
    /// All participants arrived.
    Released,
    /// The render was aborted before everyone arrived.
    Aborted,
}

impl Crossing {
    pub fn is_aborted(self) -> bool {
        self == Crossing::Aborted
    }
}

#[derive(Debug, Default)]
struct PhaseState {
    waiting: usize,
    generation: u64,
}

/// One barrier phase: a lock-protected arrival counter and its wake signal.
#[derive(Debug, Default)]
struct Phase {
    state: Mutex<PhaseState>,
    released: Condvar,
}

impl Phase {
    fn arrive(&self, parties: usize, running: &AtomicBool) -> Crossing {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.load(Ordering::Acquire) {
            return Crossing::Aborted;
        }

        state.waiting += 1;
        if state.waiting >= parties {
            state.waiting = 0;
            state.generation = state.generation.wrapping_add(1);
            drop(state);
            self.released.notify_all();
            return Crossing::Released;
        }

        let generation = state.generation;
        let mut state = self
            .released
            .wait_while(state, |s| {
                s.generation == generation && running.load(Ordering::Acquire)
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.generation != generation {
            Crossing::Released
        } else {
            // Woken by abort: withdraw so the counter only reflects blocked threads.
            state.waiting -= 1;
            Crossing::Aborted
        }
    }

    /// Wakes every waiter so it can observe the cleared run flag.
    fn interrupt(&self) {
        let _state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.released.notify_all();
    }

    fn reset(&self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).waiting = 0;
    }

    fn waiting(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).waiting
    }
}

#[derive(Debug)]
struct TileGrid {
    width: usize,
    height: usize,
    tile_size: usize,
    tiles: Vec<Tile>,
}

#[derive(Debug)]
pub struct Synchronizer {
    workers: usize,
    grid: RwLock<TileGrid>,
    cursor: AtomicUsize,
    exhausted: AtomicBool,
    running: AtomicBool,
    pre_render: Phase,
    post_render: Phase,
}

impl Synchronizer {
    /// Synchronizer for `workers` participants. The grid is empty until [`Synchronizer::init`].
    pub fn new(tile_size: usize, workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            grid: RwLock::new(TileGrid {
                width: 0,
                height: 0,
                tile_size: tile_size.max(1),
                tiles: Vec::new(),
            }),
            cursor: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
            running: AtomicBool::new(false),
            pre_render: Phase::default(),
            post_render: Phase::default(),
        }
    }

    /// Rebuilds the grid for a new frame size. No worker may be active.
    pub fn init(&self, width: usize, height: usize) {
        let tile_size = self.tile_size();
        self.reconfigure(width, height, tile_size);
    }

    /// Like [`Synchronizer::init`], also changing the tile edge.
    pub fn reconfigure(&self, width: usize, height: usize, tile_size: usize) {
        let tile_size = tile_size.max(1);
        let tiles = build_tiles(width, height, tile_size);
        debug!(width, height, tile_size, tiles = tiles.len(), "tile grid initialized");

        *self.grid.write().unwrap_or_else(PoisonError::into_inner) = TileGrid {
            width,
            height,
            tile_size,
            tiles,
        };
        self.reset_tiles();
        self.pre_render.reset();
        self.post_render.reset();
        self.running.store(true, Ordering::Release);
    }

    pub fn abort(&self) {
        self.running.store(false, Ordering::Release);
        self.pre_render.interrupt();
        self.post_render.interrupt();
    }

    pub fn resume(&self) {
        self.running.store(true, Ordering::Release);
    }

    #[inline]
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn reset_tiles(&self) {
        self.cursor.store(0, Ordering::Release);
        self.exhausted.store(false, Ordering::Release);
    }

    /// Claims the next unissued tile, or `None` once the pass's tiles are used up or the
    /// render was aborted.
    pub fn next_tile(&self) -> Option<Tile> {
        if !self.running() || self.exhausted.load(Ordering::Acquire) {
            return None;
        }
        let grid = self.grid.read().unwrap_or_else(PoisonError::into_inner);
        let index = self.cursor.fetch_add(1, Ordering::AcqRel);
        match grid.tiles.get(index) {
            Some(tile) => Some(*tile),
            None => {
                self.exhausted.store(true, Ordering::Release);
                None
            }
        }
    }

    pub fn tile_count(&self) -> usize {
        self.grid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tiles
            .len()
    }

    pub fn tile_size(&self) -> usize {
        self.grid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tile_size
    }

    pub fn dimensions(&self) -> (usize, usize) {
        let grid = self.grid.read().unwrap_or_else(PoisonError::into_inner);
        (grid.width, grid.height)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn pre_render_sync(&self, worker_id: usize) -> Crossing {
        trace!(worker_id, "pre-render barrier");
        self.pre_render.arrive(self.workers, &self.running)
    }

    pub fn post_render_sync(&self, worker_id: usize) -> Crossing {
        trace!(worker_id, "post-render barrier");
        self.post_render.arrive(self.workers, &self.running)
    }

    /// Threads currently blocked in the pre-render barrier.
    pub fn pre_render_waiting(&self) -> usize {
        self.pre_render.waiting()
    }

    /// Threads currently blocked in the post-render barrier.
    pub fn post_render_waiting(&self) -> usize {
        self.post_render.waiting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn drain(sync: &Synchronizer) -> Vec<Tile> {
        std::iter::from_fn(|| sync.next_tile()).collect()
    }

    #[test]
    fn init_starts_running_with_full_grid() {
        let sync = Synchronizer::new(32, 2);
        assert!(!sync.running());
        sync.init(64, 64);
        assert!(sync.running());
        assert_eq!(sync.tile_count(), 4);
        assert_eq!(sync.dimensions(), (64, 64));
    }

    #[test]
    fn empty_frame_is_exhausted_immediately() {
        let sync = Synchronizer::new(32, 1);
        sync.init(0, 64);
        assert_eq!(sync.tile_count(), 0);
        assert_eq!(sync.next_tile(), None);
        assert_eq!(sync.next_tile(), None);
        assert_eq!(sync.pre_render_sync(0), Crossing::Released);
        assert_eq!(sync.post_render_sync(0), Crossing::Released);
    }

    #[test]
    fn concurrent_claims_issue_every_tile_once() {
        for &threads in &[1usize, 2, 4, 8] {
            let sync = Arc::new(Synchronizer::new(8, threads));
            sync.init(203, 117);
            let expected = sync.tile_count();

            let claimed: Vec<Tile> = thread::scope(|s| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| s.spawn(|| drain(&sync)))
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|h| h.join().unwrap())
                    .collect()
            });

            assert_eq!(claimed.len(), expected, "{threads} threads");
            let unique: HashSet<Tile> = claimed.into_iter().collect();
            assert_eq!(unique.len(), expected, "{threads} threads");
        }
    }

    #[test]
    fn reset_tiles_replays_the_same_grid() {
        let sync = Synchronizer::new(16, 1);
        sync.init(50, 40);
        let first: HashSet<Tile> = drain(&sync).into_iter().collect();
        assert_eq!(sync.next_tile(), None);

        sync.reset_tiles();
        let second: HashSet<Tile> = drain(&sync).into_iter().collect();
        assert_eq!(first.len(), sync.tile_count());
        assert_eq!(first, second);
    }

    #[test]
    fn barrier_holds_until_last_arrival() {
        const N: usize = 4;
        let sync = Arc::new(Synchronizer::new(32, N));
        sync.init(32, 32);
        let (tx, rx) = mpsc::channel();

        let handles: Vec<_> = (1..N)
            .map(|id| {
                let sync = Arc::clone(&sync);
                let tx = tx.clone();
                thread::spawn(move || {
                    let crossing = sync.pre_render_sync(id);
                    tx.send((id, crossing)).unwrap();
                })
            })
            .collect();

        wait_for(|| sync.pre_render_waiting() == N - 1);
        thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err(), "a worker crossed before all arrived");

        assert_eq!(sync.pre_render_sync(0), Crossing::Released);
        for _ in 1..N {
            let (_, crossing) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(crossing, Crossing::Released);
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sync.pre_render_waiting(), 0);
    }

    #[test]
    fn barrier_is_reusable_across_passes() {
        const N: usize = 3;
        const PASSES: usize = 50;
        let sync = Arc::new(Synchronizer::new(32, N));
        sync.init(64, 64);
        let finalized = Arc::new(AtomicUsize::new(0));

        thread::scope(|s| {
            for id in 0..N {
                let sync = &sync;
                let finalized = &finalized;
                s.spawn(move || {
                    for pass in 0..PASSES {
                        assert_eq!(sync.pre_render_sync(id), Crossing::Released);
                        // Nobody may start pass k before the leader finalized pass k - 1.
                        assert_eq!(finalized.load(Ordering::Acquire), pass);
                        while sync.next_tile().is_some() {}
                        assert_eq!(sync.post_render_sync(id), Crossing::Released);
                        if id == 0 {
                            finalized.fetch_add(1, Ordering::AcqRel);
                            sync.reset_tiles();
                        }
                    }
                });
            }
        });
        assert_eq!(finalized.load(Ordering::Acquire), PASSES);
    }

    #[test]
    fn abort_releases_partial_barrier() {
        const N: usize = 4;
        const BLOCKED: usize = 2;
        let sync = Arc::new(Synchronizer::new(32, N));
        sync.init(32, 32);

        let handles: Vec<_> = (0..BLOCKED)
            .map(|id| {
                let sync = Arc::clone(&sync);
                thread::spawn(move || sync.post_render_sync(id))
            })
            .collect();

        wait_for(|| sync.post_render_waiting() == BLOCKED);
        let aborted_at = Instant::now();
        sync.abort();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Crossing::Aborted);
        }
        assert!(aborted_at.elapsed() < Duration::from_secs(2));
        assert_eq!(sync.post_render_waiting(), 0);
        assert!(!sync.running());
    }

    #[test]
    fn arrival_after_abort_returns_immediately() {
        let sync = Synchronizer::new(32, 8);
        sync.init(32, 32);
        sync.abort();
        assert_eq!(sync.pre_render_sync(3), Crossing::Aborted);
        assert_eq!(sync.pre_render_waiting(), 0);

        sync.resume();
        assert!(sync.running());
    }

    #[test]
    fn reinit_resizes_grid() {
        let sync = Synchronizer::new(32, 2);
        sync.init(64, 64);
        while sync.next_tile().is_some() {}
        sync.abort();

        sync.init(128, 64);
        assert!(sync.running());
        assert_eq!(sync.tile_count(), 8);
        assert_eq!(drain(&sync).len(), 8);

        sync.reconfigure(128, 64, 64);
        assert_eq!(sync.tile_size(), 64);
        assert_eq!(sync.tile_count(), 2);
    }
}
