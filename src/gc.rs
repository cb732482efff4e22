//! Mark-and-sweep garbage collection.
//!
//! Cells live in fixed-size blocks threaded by an intrusive free list; cells
//! whose size hint exceeds [`OVERSIZE_THRESHOLD`] go to a separate oversize
//! table. Edges between cells are plain [`ObjectId`]s that the collector traces.
//! Holders outside the heap use [`Gc<T>`] handles, which pin their cell so it is
//! never swept. Each runtime sharing the heap registers a [`RootSource`] with
//! the heap's registry; the registration is released when its token drops.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::time::Instant;

use rustc_hash::FxHashMap;
use thiserror::Error;

// ============================================================================
// ChunkBitmask - 256-bit bitmask for marking cells within a block
// ============================================================================

/// 256-bit mark bitmask, one bit per cell of a block.
#[derive(Clone, Copy, Default)]
struct ChunkBitmask {
    bits: [u64; 4],
}

impl ChunkBitmask {
    #[inline]
    fn set(&mut self, index: usize) {
        if let Some(word) = self.bits.get_mut(index >> 6) {
            *word |= 1 << (index & 63);
        }
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        self.bits
            .get(index >> 6)
            .is_some_and(|word| word & (1 << (index & 63)) != 0)
    }

    #[inline]
    fn clear(&mut self) {
        self.bits = [0; 4];
    }

    /// Iterate over unmarked indices (bits that are 0) below `len`
    fn iter_unmarked(&self, len: usize) -> UnmarkedIter<'_> {
        UnmarkedIter {
            bitmask: self,
            len,
            current_word: 0,
            current_bits: !self.bits.first().copied().unwrap_or(u64::MAX),
            base_index: 0,
        }
    }
}

struct UnmarkedIter<'a> {
    bitmask: &'a ChunkBitmask,
    len: usize,
    current_word: usize,
    // Inverted bits (1 = unmarked)
    current_bits: u64,
    base_index: usize,
}

impl Iterator for UnmarkedIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current_bits != 0 {
                let bit_pos = self.current_bits.trailing_zeros() as usize;
                let index = self.base_index + bit_pos;
                self.current_bits &= self.current_bits - 1;
                if index < self.len {
                    return Some(index);
                }
            }

            self.current_word += 1;
            self.base_index = self.current_word << 6;
            if self.base_index >= self.len {
                return None;
            }
            self.current_bits = !*self.bitmask.bits.get(self.current_word)?;
        }
    }
}

// ============================================================================
// Identifiers and traits
// ============================================================================

/// Cells per block. Matches the width of [`ChunkBitmask`].
const BLOCK_CAPACITY: usize = 256;

/// Cells whose [`Trace::size_hint`] exceeds this go to the oversize table.
pub const OVERSIZE_THRESHOLD: usize = 512;

/// Collect after this many allocations.
pub const DEFAULT_GC_THRESHOLD: usize = 1000;

/// Hard limit on live cells before the heap reports itself full.
pub const DEFAULT_MAX_LIVE: usize = 2_000_000;

/// High bit of an index marks an oversize cell.
const OVERSIZE_TAG: u32 = 1 << 31;

/// Unpinned identity of a heap cell.
///
/// Ids are what heap cells store to refer to one another. An id does not keep
/// its target alive; only reachability from a root or a [`Gc`] pin does.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    fn is_oversize(self) -> bool {
        self.index & OVERSIZE_TAG != 0
    }

    fn slot(self) -> usize {
        (self.index & !OVERSIZE_TAG) as usize
    }
}

/// Types stored in a [`Heap`].
pub trait Trace: Default {
    /// Report every [`ObjectId`] this value holds.
    fn trace(&self, visit: &mut dyn FnMut(ObjectId));

    /// Rough number of slots this value needs; large values go to the
    /// oversize table.
    fn size_hint(&self) -> usize {
        1
    }
}

/// A set of roots belonging to one runtime.
pub trait RootSource {
    fn trace_roots(&self, visit: &mut dyn FnMut(ObjectId));
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeapError {
    #[error("heap exhausted: {live} live objects (limit {limit})")]
    Full { live: usize, limit: usize },
}

// ============================================================================
// Space - blocks, free list and oversize table
// ============================================================================

struct GcBox<T> {
    data: T,
    generation: u32,
    live: bool,
    next_free: Option<u32>,
}

struct Block<T> {
    boxes: Vec<GcBox<T>>,
    marks: ChunkBitmask,
    live: usize,
}

impl<T> Block<T> {
    fn new() -> Self {
        Self {
            boxes: Vec::with_capacity(BLOCK_CAPACITY),
            marks: ChunkBitmask::default(),
            live: 0,
        }
    }
}

fn live_cell_mut<'a, T: Trace>(
    blocks: &'a mut [Block<T>],
    oversize: &'a mut [Option<Box<GcBox<T>>>],
    id: ObjectId,
) -> Option<&'a mut GcBox<T>> {
    let slot = id.slot();
    let cell = if id.is_oversize() {
        oversize.get_mut(slot).and_then(|entry| entry.as_deref_mut())
    } else {
        blocks
            .get_mut(slot / BLOCK_CAPACITY)
            .and_then(|block| block.boxes.get_mut(slot % BLOCK_CAPACITY))
    }?;
    (cell.live && cell.generation == id.generation).then_some(cell)
}

/// Storage for every cell of a heap.
pub struct Space<T: Trace> {
    blocks: Vec<Block<T>>,
    free_head: Option<u32>,
    oversize: Vec<Option<Box<GcBox<T>>>>,
    oversize_marks: Vec<bool>,
    oversize_free: Vec<u32>,
    /// Returned for reads of ids that no longer name a live cell. Never
    /// handed out mutably.
    tombstone: T,
    /// Target of writes through a dead handle, reset on every such write
    scratch: T,
    mark_stack: Vec<ObjectId>,
    next_generation: u32,
    allocs_since_gc: usize,
    gc_threshold: usize,
    max_live: usize,
    live: usize,
    full: bool,
    collections: u64,
}

impl<T: Trace> Space<T> {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            free_head: None,
            oversize: Vec::new(),
            oversize_marks: Vec::new(),
            oversize_free: Vec::new(),
            tombstone: T::default(),
            scratch: T::default(),
            mark_stack: Vec::new(),
            next_generation: 1,
            allocs_since_gc: 0,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_live: DEFAULT_MAX_LIVE,
            live: 0,
            full: false,
            collections: 0,
        }
    }

    fn cell(&self, id: ObjectId) -> Option<&GcBox<T>> {
        let cell = if id.is_oversize() {
            self.oversize.get(id.slot())?.as_deref()?
        } else {
            let slot = id.slot();
            self.blocks
                .get(slot / BLOCK_CAPACITY)?
                .boxes
                .get(slot % BLOCK_CAPACITY)?
        };
        (cell.live && cell.generation == id.generation).then_some(cell)
    }

    /// Data of a live cell, or an empty placeholder for a dead id.
    pub fn get(&self, id: ObjectId) -> &T {
        match self.cell(id) {
            Some(cell) => &cell.data,
            None => &self.tombstone,
        }
    }

    /// Data of a live cell, or `None` for a dead id.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        live_cell_mut(&mut self.blocks, &mut self.oversize, id).map(|cell| &mut cell.data)
    }

    /// Like [`Space::get_mut`], but a dead id gets a freshly reset scratch
    /// value, so stray writes never reach the tombstone that reads return.
    fn get_mut_or_scratch(&mut self, id: ObjectId) -> &mut T {
        let Space {
            blocks,
            oversize,
            scratch,
            ..
        } = self;
        match live_cell_mut(blocks, oversize, id) {
            Some(cell) => &mut cell.data,
            None => {
                tracing::warn!(?id, "write through a dead object id");
                *scratch = T::default();
                scratch
            }
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.cell(id).is_some()
    }

    fn take_generation(&mut self) -> u32 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1).max(1);
        generation
    }

    fn insert(&mut self, data: T) -> Result<ObjectId, HeapError> {
        if self.live >= self.max_live {
            self.full = true;
            return Err(HeapError::Full {
                live: self.live,
                limit: self.max_live,
            });
        }

        let generation = self.take_generation();
        let id = if data.size_hint() > OVERSIZE_THRESHOLD {
            self.insert_oversize(data, generation)
        } else {
            self.insert_small(data, generation)
        };
        self.live += 1;
        self.allocs_since_gc += 1;
        Ok(id)
    }

    fn insert_small(&mut self, data: T, generation: u32) -> ObjectId {
        if let Some(index) = self.free_head {
            let slot = index as usize;
            if let Some(block) = self.blocks.get_mut(slot / BLOCK_CAPACITY) {
                if let Some(cell) = block.boxes.get_mut(slot % BLOCK_CAPACITY) {
                    if !cell.live {
                        self.free_head = cell.next_free.take();
                        cell.data = data;
                        cell.generation = generation;
                        cell.live = true;
                        block.live += 1;
                        return ObjectId { index, generation };
                    }
                }
            }
            // The list pointed somewhere stale; drop it and rebuild at the next sweep.
            self.free_head = None;
        }

        if self
            .blocks
            .last()
            .is_none_or(|block| block.boxes.len() >= BLOCK_CAPACITY)
        {
            self.blocks.push(Block::new());
        }
        let block_index = self.blocks.len().saturating_sub(1);
        let mut index = 0;
        if let Some(block) = self.blocks.last_mut() {
            index = (block_index * BLOCK_CAPACITY + block.boxes.len()) as u32;
            block.boxes.push(GcBox {
                data,
                generation,
                live: true,
                next_free: None,
            });
            block.live += 1;
        }
        ObjectId { index, generation }
    }

    fn insert_oversize(&mut self, data: T, generation: u32) -> ObjectId {
        let cell = Box::new(GcBox {
            data,
            generation,
            live: true,
            next_free: None,
        });
        let slot = match self.oversize_free.pop() {
            Some(slot) if (slot as usize) < self.oversize.len() => {
                if let Some(entry) = self.oversize.get_mut(slot as usize) {
                    *entry = Some(cell);
                }
                slot
            }
            _ => {
                self.oversize.push(Some(cell));
                self.oversize.len().saturating_sub(1) as u32
            }
        };
        ObjectId {
            index: slot | OVERSIZE_TAG,
            generation,
        }
    }

    /// Set the mark for a live, unmarked cell. Returns false otherwise.
    fn try_mark(&mut self, id: ObjectId) -> bool {
        if self.cell(id).is_none() {
            return false;
        }
        let slot = id.slot();
        if id.is_oversize() {
            match self.oversize_marks.get_mut(slot) {
                Some(mark) if !*mark => {
                    *mark = true;
                    true
                }
                _ => false,
            }
        } else {
            match self.blocks.get_mut(slot / BLOCK_CAPACITY) {
                Some(block) if !block.marks.get(slot % BLOCK_CAPACITY) => {
                    block.marks.set(slot % BLOCK_CAPACITY);
                    true
                }
                _ => false,
            }
        }
    }

    fn mark(&mut self, roots: Vec<ObjectId>) -> usize {
        for block in &mut self.blocks {
            block.marks.clear();
        }
        self.oversize_marks.clear();
        self.oversize_marks.resize(self.oversize.len(), false);

        let mut stack = std::mem::take(&mut self.mark_stack);
        stack.clear();
        stack.extend(roots);

        let mut marked = 0;
        while let Some(id) = stack.pop() {
            if !self.try_mark(id) {
                continue;
            }
            marked += 1;
            if let Some(cell) = self.cell(id) {
                cell.data.trace(&mut |child| stack.push(child));
            }
        }

        self.mark_stack = stack;
        marked
    }

    fn sweep(&mut self) -> usize {
        let mut collected = 0;

        for block in &mut self.blocks {
            let unmarked: Vec<usize> = block.marks.iter_unmarked(block.boxes.len()).collect();
            for index in unmarked {
                if let Some(cell) = block.boxes.get_mut(index) {
                    if cell.live {
                        cell.data = T::default();
                        cell.live = false;
                        block.live -= 1;
                        collected += 1;
                    }
                }
            }
        }

        for (slot, (entry, marked)) in self
            .oversize
            .iter_mut()
            .zip(self.oversize_marks.iter())
            .enumerate()
        {
            if entry.is_some() && !marked {
                *entry = None;
                self.oversize_free.push(slot as u32);
                collected += 1;
            }
        }

        self.live = self.live.saturating_sub(collected);
        collected
    }

    /// Release trailing empty blocks and shrink the oversize table, then
    /// rebuild the free list over what remains.
    fn compact(&mut self) {
        let before = self.blocks.len();
        while self.blocks.last().is_some_and(|block| block.live == 0) {
            self.blocks.pop();
        }
        if self.blocks.len() != before {
            tracing::debug!(
                released = before - self.blocks.len(),
                remaining = self.blocks.len(),
                "released empty heap blocks"
            );
        }

        while matches!(self.oversize.last(), Some(None)) {
            self.oversize.pop();
        }
        let len = self.oversize.len() as u32;
        self.oversize_free.retain(|slot| *slot < len);
        if self.oversize.capacity() > 16 && self.oversize.len() * 4 < self.oversize.capacity() {
            self.oversize.shrink_to_fit();
            self.oversize_free.shrink_to_fit();
            tracing::debug!(len = self.oversize.len(), "shrank oversize index");
        }

        let mut head = None;
        for (block_index, block) in self.blocks.iter_mut().enumerate().rev() {
            for (offset, cell) in block.boxes.iter_mut().enumerate().rev() {
                if !cell.live {
                    cell.next_free = head;
                    head = Some((block_index * BLOCK_CAPACITY + offset) as u32);
                }
            }
        }
        self.free_head = head;
    }

    fn stats(&self) -> GcStats {
        let block_cells: usize = self.blocks.iter().map(|block| block.boxes.len()).sum();
        let block_live: usize = self.blocks.iter().map(|block| block.live).sum();
        let oversize_objects = self.oversize.iter().filter(|entry| entry.is_some()).count();
        GcStats {
            total_cells: block_cells + self.oversize.len(),
            live_objects: self.live,
            free_cells: block_cells - block_live,
            blocks: self.blocks.len(),
            oversize_objects,
            pinned: 0,
            collections: self.collections,
            full: self.full,
        }
    }
}

// ============================================================================
// Root registry
// ============================================================================

/// Root sets of the runtimes that share a heap.
#[derive(Default)]
struct RootRegistry {
    sources: RefCell<Vec<(u64, Weak<dyn RootSource>)>>,
    next_key: Cell<u64>,
}

impl RootRegistry {
    fn register(&self, source: Weak<dyn RootSource>) -> u64 {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.sources.borrow_mut().push((key, source));
        key
    }

    fn unregister(&self, key: u64) {
        self.sources.borrow_mut().retain(|(k, _)| *k != key);
    }

    fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    fn trace_all(&self, visit: &mut dyn FnMut(ObjectId)) {
        let live: Vec<Rc<dyn RootSource>> = self
            .sources
            .borrow()
            .iter()
            .filter_map(|(_, source)| source.upgrade())
            .collect();
        for source in live {
            source.trace_roots(visit);
        }
    }
}

/// Token returned by [`Heap::register_roots`]. Dropping it removes the root
/// set from the heap.
pub struct Registration<T: Trace> {
    key: u64,
    heap: Weak<HeapInner<T>>,
}

impl<T: Trace> Drop for Registration<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.heap.upgrade() {
            inner.registry.unregister(self.key);
        }
    }
}

// ============================================================================
// Heap - the public wrapper
// ============================================================================

struct HeapInner<T: Trace> {
    space: RefCell<Space<T>>,
    pins: RefCell<FxHashMap<ObjectId, u32>>,
    registry: RootRegistry,
}

impl<T: Trace> HeapInner<T> {
    fn pin(&self, id: ObjectId) {
        *self.pins.borrow_mut().entry(id).or_insert(0) += 1;
    }

    fn unpin(&self, id: ObjectId) {
        let mut pins = self.pins.borrow_mut();
        if let Some(count) = pins.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&id);
            }
        }
    }
}

/// Shared handle to a garbage-collected heap. Cloning shares the heap.
pub struct Heap<T: Trace> {
    inner: Rc<HeapInner<T>>,
}

impl<T: Trace> Heap<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(HeapInner {
                space: RefCell::new(Space::new()),
                pins: RefCell::new(FxHashMap::default()),
                registry: RootRegistry::default(),
            }),
        }
    }

    /// Allocate a cell holding `data`, collecting first if the allocation
    /// threshold was reached. The returned handle pins the new cell.
    pub fn alloc(&self, data: T) -> Result<Gc<T>, HeapError> {
        let wants_collection = {
            let space = self.inner.space.borrow();
            (space.gc_threshold > 0 && space.allocs_since_gc >= space.gc_threshold)
                || space.live >= space.max_live
        };
        if wants_collection {
            self.collect();
        }

        let id = self.inner.space.borrow_mut().insert(data);
        match id {
            Ok(id) => Ok(Gc::new(id, self.inner.clone())),
            Err(err) => {
                tracing::warn!(%err, "allocation refused");
                Err(err)
            }
        }
    }

    /// Run a full mark-and-sweep cycle. Returns the number of cells freed.
    ///
    /// Does nothing if the heap is currently borrowed.
    pub fn collect(&self) -> usize {
        let started = Instant::now();
        let mut roots: Vec<ObjectId> = self.inner.pins.borrow().keys().copied().collect();
        self.inner.registry.trace_all(&mut |id| roots.push(id));

        let Ok(mut space) = self.inner.space.try_borrow_mut() else {
            tracing::debug!("collection skipped, heap is borrowed");
            return 0;
        };
        let marked = space.mark(roots);
        let collected = space.sweep();
        space.compact();
        space.allocs_since_gc = 0;
        space.collections += 1;
        space.full = space.live >= space.max_live;
        if space.full {
            tracing::warn!(live = space.live, limit = space.max_live, "heap is full");
        }

        tracing::debug!(
            marked,
            collected,
            live = space.live,
            blocks = space.blocks.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "gc cycle"
        );
        collected
    }

    /// Take a pinned handle to an existing cell.
    pub fn pin(&self, id: ObjectId) -> Gc<T> {
        Gc::new(id, self.inner.clone())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.space.borrow().contains(id)
    }

    pub fn get(&self, id: ObjectId) -> Ref<'_, T> {
        Ref::map(self.inner.space.borrow(), |space| space.get(id))
    }

    /// Mutable access to a live cell; `None` once the cell is collected.
    pub fn get_mut(&self, id: ObjectId) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.inner.space.borrow_mut(), |space| space.get_mut(id)).ok()
    }

    /// Borrow the whole space for walks that touch several cells.
    pub fn space(&self) -> Ref<'_, Space<T>> {
        self.inner.space.borrow()
    }

    /// Register a root set. The set is traced on every collection until the
    /// returned token is dropped or the source itself is dropped.
    pub fn register_roots(&self, source: &Rc<dyn RootSource>) -> Registration<T> {
        let key = self.inner.registry.register(Rc::downgrade(source));
        Registration {
            key,
            heap: Rc::downgrade(&self.inner),
        }
    }

    pub fn registered_runtimes(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn stats(&self) -> GcStats {
        let mut stats = self.inner.space.borrow().stats();
        stats.pinned = self.inner.pins.borrow().len();
        stats
    }

    /// Allocations between automatic collections (0 disables them).
    pub fn set_gc_threshold(&self, threshold: usize) {
        self.inner.space.borrow_mut().gc_threshold = threshold;
    }

    pub fn set_max_live(&self, limit: usize) {
        self.inner.space.borrow_mut().max_live = limit.max(1);
    }

    pub fn is_full(&self) -> bool {
        self.inner.space.borrow().full
    }

    pub fn ptr_eq(a: &Heap<T>, b: &Heap<T>) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T: Trace> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trace> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap {
            inner: self.inner.clone(),
        }
    }
}

// ============================================================================
// Gc - pinned handle
// ============================================================================

/// A pinned handle to a heap cell.
///
/// Works like `Rc<T>`: cloning adds a pin, dropping removes one. A cell with
/// at least one pin is a root and is never swept.
pub struct Gc<T: Trace> {
    id: ObjectId,
    heap: Rc<HeapInner<T>>,
}

impl<T: Trace> Gc<T> {
    fn new(id: ObjectId, heap: Rc<HeapInner<T>>) -> Self {
        heap.pin(id);
        Self { id, heap }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.heap.space.borrow(), |space| space.get(self.id))
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.heap.space.borrow_mut(), |space| {
            space.get_mut_or_scratch(self.id)
        })
    }

    pub fn ptr_eq(a: &Gc<T>, b: &Gc<T>) -> bool {
        a.id == b.id
    }

    /// The heap this handle belongs to.
    pub fn heap(&self) -> Heap<T> {
        Heap {
            inner: self.heap.clone(),
        }
    }
}

impl<T: Trace> Clone for Gc<T> {
    fn clone(&self) -> Self {
        Gc::new(self.id, self.heap.clone())
    }
}

impl<T: Trace> Drop for Gc<T> {
    fn drop(&mut self) {
        self.heap.unpin(self.id);
    }
}

impl<T: Trace> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: Trace> Eq for Gc<T> {}

impl<T: Trace> std::hash::Hash for Gc<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Trace> std::fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gc").field("id", &self.id).finish()
    }
}

// ============================================================================
// GcStats
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GcStats {
    /// Cells in blocks plus oversize slots, live or free
    pub total_cells: usize,
    pub live_objects: usize,
    /// Free block cells available for reuse
    pub free_cells: usize,
    pub blocks: usize,
    pub oversize_objects: usize,
    /// Cells currently held by at least one `Gc` handle
    pub pinned: usize,
    pub collections: u64,
    pub full: bool,
}

// ============================================================================
// Tests
// ============================================================================
