//! Graph topology snapshot codec.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! [magic: b"HNSW"][version: u32][m: u32][node_count: u32]
//! per node, in id order:
//!     [layer_count: u32]
//!     per layer, bottom to top: [degree: u32][neighbor id: u32] * degree
//! [crc32: u32 of everything before it]
//! ```
//!
//! Items and distances are never written; the caller re-supplies the item
//! sequence on restore and ids bind by position. Only `m` is persisted from
//! the parameters; the remaining knobs re-derive defaults. The entry point
//! is not stored either: it is recomputed as the node with the highest top
//! layer, ties to the smallest id, which matches how construction promotes
//! entry points.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32Hasher;
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use crate::node::Node;

/// Magic bytes identifying a graph snapshot.
const MAGIC: &[u8; 4] = b"HNSW";

/// Current snapshot format version.
const VERSION: u32 = 1;

/// Serialize graph topology plus the degree target `m`.
pub(crate) fn encode(graph: &Graph, m: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    buf.write_u32::<LittleEndian>(VERSION).unwrap();
    buf.write_u32::<LittleEndian>(m as u32).unwrap();
    buf.write_u32::<LittleEndian>(graph.len() as u32).unwrap();

    for (_, node) in graph.iter() {
        buf.write_u32::<LittleEndian>(node.layers().len() as u32).unwrap();
        for list in node.layers() {
            buf.write_u32::<LittleEndian>(list.len() as u32).unwrap();
            for &neighbor in list {
                buf.write_u32::<LittleEndian>(neighbor).unwrap();
            }
        }
    }

    let mut hasher = Crc32Hasher::new();
    hasher.update(&buf);
    let crc = hasher.finalize();
    buf.write_u32::<LittleEndian>(crc).unwrap();

    tracing::debug!(bytes = buf.len(), nodes = graph.len(), "encoded graph snapshot");
    buf
}

/// Deserialize a snapshot, returning the graph and the stored `m`.
///
/// Verifies the checksum first, then the layout, then the structural
/// invariants (id range, self-loops, duplicate and asymmetric edges).
pub(crate) fn decode(bytes: &[u8]) -> Result<(Graph, usize)> {
    // magic + version + m + node_count + crc
    const MIN_LEN: usize = 4 + 4 + 4 + 4 + 4;
    if bytes.len() < MIN_LEN {
        return Err(Error::corrupt(
            0,
            format!("snapshot too short: {} bytes", bytes.len()),
        ));
    }

    let (body, trailer) = bytes.split_at(bytes.len() - 4);
    let stored_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let mut hasher = Crc32Hasher::new();
    hasher.update(body);
    let actual_crc = hasher.finalize();
    if actual_crc != stored_crc {
        return Err(Error::corrupt(
            body.len() as u64,
            format!("checksum mismatch: expected {:08x}, got {:08x}", stored_crc, actual_crc),
        ));
    }

    let mut cursor = Cursor::new(body);

    let mut magic = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut magic)
        .map_err(|_| Error::corrupt(0, "unexpected end of snapshot reading magic"))?;
    if &magic != MAGIC {
        return Err(Error::corrupt(0, "bad magic bytes"));
    }

    let version = read_u32(&mut cursor, "version")?;
    if version != VERSION {
        return Err(Error::corrupt(4, format!("unsupported snapshot version {}", version)));
    }

    let m = read_u32(&mut cursor, "m")? as usize;
    if m < 2 {
        return Err(Error::corrupt(8, format!("stored degree target {} out of range", m)));
    }

    let node_count = read_u32(&mut cursor, "node count")? as usize;

    let mut nodes: Vec<Node> = Vec::new();
    for id in 0..node_count {
        let layer_count = read_u32(&mut cursor, "layer count")? as usize;
        if layer_count == 0 {
            return Err(Error::corrupt(
                cursor.position() - 4,
                format!("node {} has zero layers", id),
            ));
        }
        ensure_remaining(&cursor, layer_count, "layer table")?;

        let mut connections = Vec::with_capacity(layer_count);
        for _ in 0..layer_count {
            let degree = read_u32(&mut cursor, "degree")? as usize;
            ensure_remaining(&cursor, degree, "neighbor list")?;

            let mut list = Vec::with_capacity(degree);
            for _ in 0..degree {
                list.push(read_u32(&mut cursor, "neighbor id")? as NodeId);
            }
            connections.push(list);
        }
        nodes.push(Node::from_connections(connections));
    }

    if cursor.position() as usize != body.len() {
        return Err(Error::corrupt(
            cursor.position(),
            format!("{} trailing bytes after node data", body.len() - cursor.position() as usize),
        ));
    }

    // Entry point: highest top layer, ties to the smallest id.
    let mut entry_point: Option<NodeId> = None;
    let mut entry_layer = 0usize;
    for (id, node) in nodes.iter().enumerate() {
        if entry_point.is_none() || node.max_layer() > entry_layer {
            entry_point = Some(id as NodeId);
            entry_layer = node.max_layer();
        }
    }

    let graph = Graph::from_parts(nodes, entry_point);
    graph.validate()?;

    tracing::debug!(bytes = bytes.len(), nodes = graph.len(), "decoded graph snapshot");
    Ok((graph, m))
}

fn read_u32(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<u32> {
    let offset = cursor.position();
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::corrupt(offset, format!("unexpected end of snapshot reading {}", what)))
}

/// Refuse counts that promise more u32 words than the snapshot holds, so a
/// corrupt length cannot drive a huge allocation.
fn ensure_remaining(cursor: &Cursor<&[u8]>, words: usize, what: &str) -> Result<()> {
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if (words as u64) * 4 > remaining {
        return Err(Error::corrupt(
            cursor.position(),
            format!("{} promises {} entries but only {} bytes remain", what, words, remaining),
        ));
    }
    Ok(())
}
