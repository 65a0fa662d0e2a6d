use std::ops::ControlFlow;
use std::time::Instant;

use log::{debug, info};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::hashimoto::page_count;
use crate::node::Node;
use crate::storage::DatasetStorage;
use crate::{fnv, DATASET_PARENTS, NODE_BYTES, NODE_WORDS};

/// Number of progress callbacks over a full build.
const PROGRESS_STEPS: u64 = 100;

/// Dataset node `index`, derived from the cache alone.
///
/// Independent of every other index, so any partition of the index range can
/// be computed by separate workers.
pub fn calc_dataset_item(cache: &Cache, index: u32) -> Node {
    let nodes = cache.nodes();
    let n = nodes.len() as u32;

    let mut mix = nodes[(index % n) as usize];
    mix.set_word(0, mix.word(0) ^ index);
    mix.rehash();

    let mut words = mix.words();
    for j in 0..DATASET_PARENTS {
        let parent = fnv(index ^ j, words[j as usize % NODE_WORDS]) % n;
        let parent = nodes[parent as usize].words();
        for (w, p) in words.iter_mut().zip(parent.iter()) {
            *w = fnv(*w, *p);
        }
    }

    let mut item = Node::from_words(&words);
    item.rehash();
    item
}

/// Drives [`calc_dataset_item`] over a whole dataset.
///
/// Nodes are generated in batches; between batches the progress callback runs
/// on the calling thread with a counter that only grows. Returning
/// [`ControlFlow::Break`] stops generation before the next batch.
pub struct DatasetBuilder<'a> {
    cache: &'a Cache,
    full_size: u64,
    #[cfg(feature = "parallel")]
    threads: usize,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(cache: &'a Cache, full_size: u64) -> Result<Self> {
        page_count(full_size)?;
        Ok(Self {
            cache,
            full_size,
            #[cfg(feature = "parallel")]
            threads: num_cpus::get(),
        })
    }

    /// Worker count for generation. Defaults to the number of CPUs.
    #[cfg(feature = "parallel")]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn node_count(&self) -> u64 {
        self.full_size / NODE_BYTES as u64
    }

    /// Generates the dataset into `storage`, which must be exactly
    /// `full_size` bytes long.
    pub fn build<S, F>(&self, storage: &mut S, mut progress: F) -> Result<()>
    where
        S: DatasetStorage + ?Sized,
        F: FnMut(u32) -> ControlFlow<()>,
    {
        if storage.len() != self.full_size {
            return Err(Error::invalid(format!(
                "storage holds {} bytes, dataset needs {}",
                storage.len(),
                self.full_size
            )));
        }

        let total = self.node_count();
        let batch = (total / PROGRESS_STEPS).max(1);
        let mut buf = Vec::new();
        buf.try_reserve_exact(batch as usize).map_err(|_| Error::OutOfMemory {
            bytes: batch * NODE_BYTES as u64,
        })?;

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        info!(
            "generating dataset: {} nodes ({} MB)",
            total,
            self.full_size / (1024 * 1024)
        );
        let started = Instant::now();
        let mut start = 0u64;
        let mut step = 0u32;
        while start < total {
            if progress(step).is_break() {
                info!("dataset generation cancelled at node {} of {}", start, total);
                return Err(Error::Cancelled);
            }
            step += 1;

            let len = batch.min(total - start);
            buf.clear();
            buf.resize(len as usize, Node::zero());

            #[cfg(feature = "parallel")]
            pool.install(|| self.fill_batch(&mut buf, start as u32));
            #[cfg(not(feature = "parallel"))]
            self.fill_batch(&mut buf, start as u32);

            storage.write_nodes(start, &buf)?;
            start += len;
        }
        debug!("dataset generated in {:?}", started.elapsed());
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn fill_batch(&self, buf: &mut [Node], first: u32) {
        use rayon::prelude::*;
        buf.par_iter_mut().enumerate().for_each(|(k, node)| {
            *node = calc_dataset_item(self.cache, first + k as u32);
        });
    }

    #[cfg(not(feature = "parallel"))]
    fn fill_batch(&self, buf: &mut [Node], first: u32) {
        for (k, node) in buf.iter_mut().enumerate() {
            *node = calc_dataset_item(self.cache, first + k as u32);
        }
    }
}
