//! Backing stores for a materialized dataset.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::node::Node;
use crate::NODE_BYTES;

/// Byte-addressable region holding dataset nodes.
///
/// Written once while the dataset is generated, then only read, from any
/// number of threads.
pub trait DatasetStorage: Send + Sync {
    /// Size of the region in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `nodes` starting at node index `first`.
    fn write_nodes(&mut self, first: u64, nodes: &[Node]) -> io::Result<()>;

    fn read_node(&self, index: u64) -> io::Result<Node>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Releases whatever backs the region after a failed generation.
    fn discard(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where a full client keeps its dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Memory,
    /// A file at exactly this path, created or truncated.
    File(PathBuf),
}

impl StorageLocation {
    pub fn open(&self, full_size: u64) -> Result<Box<dyn DatasetStorage>> {
        let storage: Box<dyn DatasetStorage> = match self {
            StorageLocation::Memory => Box::new(MemoryStorage::allocate(full_size)?),
            StorageLocation::File(path) => Box::new(FileStorage::create(path, full_size)?),
        };
        Ok(storage)
    }
}

fn out_of_range(index: u64, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("node {} is past the end of a {} byte dataset", index, len),
    )
}

#[derive(Default)]
pub struct MemoryStorage {
    nodes: Vec<Node>,
}

impl MemoryStorage {
    /// Zeroed storage for `full_size` bytes.
    pub fn allocate(full_size: u64) -> Result<Self> {
        if full_size % NODE_BYTES as u64 != 0 {
            return Err(Error::invalid(format!(
                "dataset size {} is not a multiple of {}",
                full_size, NODE_BYTES
            )));
        }
        let n = usize::try_from(full_size / NODE_BYTES as u64)
            .map_err(|_| Error::OutOfMemory { bytes: full_size })?;
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory { bytes: full_size })?;
        nodes.resize(n, Node::zero());
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl DatasetStorage for MemoryStorage {
    fn len(&self) -> u64 {
        (self.nodes.len() * NODE_BYTES) as u64
    }

    fn write_nodes(&mut self, first: u64, nodes: &[Node]) -> io::Result<()> {
        let len = self.len();
        let end = first.saturating_add(nodes.len() as u64);
        let slot = usize::try_from(first)
            .ok()
            .zip(usize::try_from(end).ok())
            .and_then(|(first, end)| self.nodes.get_mut(first..end))
            .ok_or_else(|| out_of_range(end, len))?;
        slot.copy_from_slice(nodes);
        Ok(())
    }

    fn read_node(&self, index: u64) -> io::Result<Node> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.nodes.get(i))
            .copied()
            .ok_or_else(|| out_of_range(index, self.len()))
    }

    fn discard(&mut self) -> io::Result<()> {
        self.nodes = Vec::new();
        Ok(())
    }
}

/// Dataset kept in a file. Reads are positional, so lookups share the handle
/// without locking.
pub struct FileStorage {
    path: PathBuf,
    file: File,
    len: u64,
}

impl FileStorage {
    pub fn create(path: impl AsRef<Path>, full_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        if let Err(e) = file.set_len(full_size) {
            drop(file);
            if let Err(rm) = std::fs::remove_file(&path) {
                warn!("failed to remove {}: {}", path.display(), rm);
            }
            return Err(e.into());
        }
        debug!("dataset file {} sized to {} bytes", path.display(), full_size);
        Ok(Self {
            path,
            file,
            len: full_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn node_count(&self) -> u64 {
        self.len / NODE_BYTES as u64
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        while !buf.is_empty() {
            match self.file.seek_read(buf, offset)? {
                0 => return Err(io::ErrorKind::UnexpectedEof.into()),
                n => {
                    buf = &mut std::mem::take(&mut buf)[n..];
                    offset += n as u64;
                }
            }
        }
        Ok(())
    }
}

impl DatasetStorage for FileStorage {
    fn len(&self) -> u64 {
        self.len
    }

    fn write_nodes(&mut self, first: u64, nodes: &[Node]) -> io::Result<()> {
        let end = first.saturating_add(nodes.len() as u64);
        if end > self.node_count() {
            return Err(out_of_range(end, self.len));
        }
        let bytes: Vec<u8> = nodes.iter().flat_map(|n| n.0).collect();
        self.file.seek(SeekFrom::Start(first * NODE_BYTES as u64))?;
        self.file.write_all(&bytes)
    }

    fn read_node(&self, index: u64) -> io::Result<Node> {
        if index >= self.node_count() {
            return Err(out_of_range(index, self.len));
        }
        let mut node = Node::zero();
        self.read_at(&mut node.0, index * NODE_BYTES as u64)?;
        Ok(node)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }

    fn discard(&mut self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("removed partial dataset file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("failed to remove {}: {}", self.path.display(), e);
                Err(e)
            }
        }
    }
}
