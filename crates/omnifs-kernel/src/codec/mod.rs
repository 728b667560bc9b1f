//! Container image codec.
//!
//! [`format`] writes a fresh container, [`load`] rebuilds a
//! [`StorageEngine`] from one, and [`save`] writes an engine back. The
//! whole image is read and written in one piece; there is no journal.
//!
//! Loading is permissive: a truncated or corrupt namespace region yields
//! whatever prefix of the tree decoded cleanly, with a warning, rather than
//! an error. Only an unreadable file or an unusable header fails the load.

pub mod header;
pub mod layout;
pub mod records;
pub mod report;

use std::ops::Range;
use std::path::Path;

use omnifs_types::{DirEntry, unix_now};

use self::header::ContainerHeader;
use self::layout::{CHILD_COUNT_SIZE, ENTRY_SIZE, USER_SLOT_SIZE, bitmap_len};
use crate::config::ContainerConfig;
use crate::engine::{ROOT_NAME, StorageEngine};
use crate::error::FsResult;
use crate::identity::IdentityStore;
use crate::ledger::FreeBlockLedger;
use crate::tree::{NamespaceTree, Node};

/// Write a freshly formatted container to `path`.
pub fn format(path: impl AsRef<Path>, config: &ContainerConfig) -> FsResult<()> {
    let path = path.as_ref();
    let engine = StorageEngine::new(config)?;
    save(&engine, path)?;
    tracing::info!(
        path = %path.display(),
        total_size = config.total_size,
        block_size = config.block_size,
        max_users = config.max_users,
        "container formatted"
    );
    Ok(())
}

/// Serialize `engine` to `path`, replacing the file.
pub fn save(engine: &StorageEngine, path: impl AsRef<Path>) -> FsResult<()> {
    let path = path.as_ref();
    let image = encode(engine);
    std::fs::write(path, &image)?;
    tracing::info!(path = %path.display(), bytes = image.len(), nodes = engine.tree.len(), "container saved");
    Ok(())
}

/// Read a container and rebuild the engine, bound to `path`.
///
/// `config` is only compared against the stored header; where they
/// disagree the header wins.
pub fn load(path: impl AsRef<Path>, config: &ContainerConfig) -> FsResult<StorageEngine> {
    let path = path.as_ref();
    let image = std::fs::read(path)?;
    let mut engine = decode(&image, config)?;
    engine.bind(path);
    tracing::info!(
        path = %path.display(),
        users = engine.identity.active_user_count(),
        nodes = engine.tree.len(),
        "container loaded"
    );
    Ok(engine)
}

/// The full container image of `engine`.
pub fn encode(engine: &StorageEngine) -> Vec<u8> {
    let header = &engine.header;
    let mut out = Vec::new();
    header.encode(&mut out);
    out.resize(header.user_table_offset as usize, 0);

    let mut written = 0;
    for user in engine
        .identity
        .persisted_records()
        .take(header.max_users as usize)
    {
        records::encode_user(user, &mut out);
        written += 1;
    }
    for _ in written..header.max_users {
        records::encode_empty_user(&mut out);
    }

    let tree = &engine.tree;
    for id in tree.preorder(tree.root()) {
        let Some(node) = tree.get(id) else { continue };
        debug_assert!(node.is_dir() || node.entry.size == node.data.len() as u64);
        records::encode_entry(&node.entry, &mut out);
        out.extend_from_slice(&(node.children().len() as u32).to_le_bytes());
        if !node.is_dir() {
            out.extend_from_slice(&node.data);
        }
    }

    out.extend_from_slice(engine.ledger.as_bytes());
    out
}

/// Byte ranges of the regions after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Regions {
    pub user_table: Range<usize>,
    pub tree: Range<usize>,
    /// `None` when the image is too short to hold a bitmap after the table.
    pub bitmap: Option<Range<usize>>,
}

impl Regions {
    pub(crate) fn locate(header: &ContainerHeader, image_len: usize) -> Self {
        let table_start = header.user_table_offset as usize;
        let table_end = header.user_table_end() as usize;
        let bm_len = bitmap_len(header.total_blocks());
        if image_len >= table_end + bm_len {
            let bm_start = image_len - bm_len;
            Self {
                user_table: table_start..table_end,
                tree: table_end..bm_start,
                bitmap: Some(bm_start..image_len),
            }
        } else {
            let end = table_end.min(image_len);
            Self {
                user_table: table_start.min(image_len)..end,
                tree: end..image_len,
                bitmap: None,
            }
        }
    }
}

/// Rebuild an unbound engine from an in-memory image.
///
/// The header must be usable and its user table and bitmap must fit in
/// the image; past that, a short or corrupt namespace keeps its decoded
/// prefix.
pub fn decode(image: &[u8], config: &ContainerConfig) -> FsResult<StorageEngine> {
    let header = ContainerHeader::decode(image)?;
    header.check_fits(image.len())?;
    warn_on_config_mismatch(&header, config);
    let regions = Regions::locate(&header, image.len());

    let mut identity = IdentityStore::new(header.max_users);
    for slot in image[regions.user_table.clone()].chunks_exact(USER_SLOT_SIZE) {
        identity.insert_loaded(records::decode_user(slot));
    }

    let owner = identity
        .persisted_records()
        .next()
        .map(|u| u.username.clone())
        .unwrap_or_else(|| config.admin_username.clone());
    let (tree, complete) = decode_tree(&image[regions.tree.clone()], &owner);
    if !complete {
        tracing::warn!(
            nodes = tree.len(),
            region = regions.tree.len(),
            "namespace region truncated or corrupt, keeping the decoded prefix"
        );
    }

    let ledger = match &regions.bitmap {
        Some(range) => {
            let ledger = FreeBlockLedger::from_bytes(header.total_blocks(), &image[range.clone()]);
            if complete {
                ledger
            } else if (0..metadata_blocks(&header)).any(|b| ledger.is_free(b)) {
                // the tail is tree bytes, not a bitmap
                tracing::warn!(
                    "trailing bitmap leaves metadata blocks free, rebuilding from the metadata layout"
                );
                metadata_ledger(&header)
            } else {
                tracing::warn!(
                    "namespace ended early, the trailing bitmap may hold tree bytes"
                );
                ledger
            }
        }
        None => {
            tracing::warn!("bitmap region missing, rebuilding from the metadata layout");
            metadata_ledger(&header)
        }
    };

    Ok(StorageEngine::from_parts(header, tree, identity, ledger))
}

/// Blocks covered by the header, user table and root entry.
fn metadata_blocks(header: &ContainerHeader) -> u64 {
    (header.user_table_end() + ENTRY_SIZE as u64).div_ceil(header.block_size)
}

/// A ledger with only the metadata region marked used.
fn metadata_ledger(header: &ContainerHeader) -> FreeBlockLedger {
    let mut ledger = FreeBlockLedger::new(header.total_blocks());
    for block in 0..metadata_blocks(header) {
        ledger.mark_used(block);
    }
    ledger
}

fn warn_on_config_mismatch(header: &ContainerHeader, config: &ContainerConfig) {
    if header.total_size != config.total_size
        || header.block_size != config.block_size
        || header.max_users != config.max_users
    {
        tracing::warn!(
            header_total_size = header.total_size,
            header_block_size = header.block_size,
            header_max_users = header.max_users,
            config_total_size = config.total_size,
            config_block_size = config.block_size,
            config_max_users = config.max_users,
            "config disagrees with container header, using the header"
        );
    }
}

/// Bounded reader over the namespace region.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn entry(&mut self) -> Option<DirEntry> {
        records::decode_entry(self.take(ENTRY_SIZE)?)
    }

    fn child_count(&mut self) -> Option<u32> {
        let raw = self.take(CHILD_COUNT_SIZE)?;
        Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// One encoded node: entry, child count, payload for files.
    fn node(&mut self) -> Option<(Node, u32)> {
        let entry = self.entry()?;
        let children = self.child_count()?;
        if entry.is_dir() {
            return Some((Node::new(entry), children));
        }
        if children != 0 {
            return None;
        }
        let size = usize::try_from(entry.size).ok()?;
        let data = self.take(size)?.to_vec();
        Some((Node::with_data(entry, data), 0))
    }
}

/// Decode the pre-order tree. Returns the tree and whether every declared
/// node was decoded.
fn decode_tree(region: &[u8], fallback_owner: &str) -> (NamespaceTree, bool) {
    let mut cursor = Cursor { buf: region, pos: 0 };

    let (root, root_children) = match cursor.node() {
        Some((node, children)) if node.is_dir() => (node, children),
        _ => {
            let root = DirEntry::directory(ROOT_NAME, fallback_owner, 0, unix_now());
            return (NamespaceTree::new(root), false);
        }
    };
    let mut tree = NamespaceTree::new(root.entry);

    // (directory, children still to read)
    let mut pending = vec![(tree.root(), root_children)];
    while let Some(top) = pending.last_mut() {
        if top.1 == 0 {
            pending.pop();
            continue;
        }
        top.1 -= 1;
        let parent = top.0;

        let Some((node, children)) = cursor.node() else {
            return (tree, false);
        };
        let is_dir = node.is_dir();
        let Ok(id) = tree.add_child(parent, node) else {
            return (tree, false);
        };
        if is_dir && children > 0 {
            pending.push((id, children));
        }
    }
    (tree, true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use omnifs_types::ErrorCode;

    fn small_config() -> ContainerConfig {
        ContainerConfig {
            total_size: 1024 * 1024,
            block_size: 4096,
            max_users: 4,
            ..ContainerConfig::default()
        }
    }

    #[test]
    fn test_fresh_image_layout() {
        let config = small_config();
        let engine = StorageEngine::new(&config).unwrap();
        let image = encode(&engine);
        // header + 4 slots + root entry + child count + 256 blocks / 8
        assert_eq!(image.len(), 512 + 4 * 128 + 416 + 4 + 32);
        assert_eq!(&image[0..8], b"OMNIFS01");
        assert_eq!(&image[512..517], b"admin");
        assert!(image[640..1024].iter().all(|&b| b == 0));
        assert_eq!(&image[1024..1025], b"/");
        assert_eq!(&image[1440..1444], &0u32.to_le_bytes());
        // 1440 metadata bytes fit in block 0
        assert_eq!(image[1444], 0b0000_0001);
    }

    #[test]
    fn test_decode_restores_engine() {
        let config = small_config();
        let mut engine = StorageEngine::new(&config).unwrap();
        let s = engine.login("admin", "admin123").unwrap();
        engine.dir_create(s, "/d").unwrap();
        engine.file_create(s, "/d/f", b"payload").unwrap();
        engine.file_create(s, "/g", b"").unwrap();

        let image = encode(&engine);
        let mut back = decode(&image, &config).unwrap();
        assert_eq!(encode(&back), image);

        let s = back.login("admin", "admin123").unwrap();
        assert_eq!(back.file_read(s, "/d/f").unwrap(), b"payload");
        // inode numbering resumes past the highest stored inode
        back.file_create(s, "/h", b"").unwrap();
        assert_eq!(back.get_metadata(s, "/h").unwrap().entry.inode, 4);
    }

    #[test]
    fn test_truncated_tree_keeps_prefix() {
        let config = small_config();
        let mut engine = StorageEngine::new(&config).unwrap();
        let s = engine.login("admin", "admin123").unwrap();
        engine.file_create(s, "/a", b"aaaa").unwrap();
        engine.file_create(s, "/b", b"bbbb").unwrap();
        let image = encode(&engine);

        // drop the bitmap and half of /b's entry
        let tree_start = 512 + 4 * 128;
        let cut = tree_start + (ENTRY_SIZE + 4) + (ENTRY_SIZE + 4 + 4) + 200;
        let mut back = decode(&image[..cut], &config).unwrap();
        let s = back.login("admin", "admin123").unwrap();
        assert_eq!(back.file_read(s, "/a").unwrap(), b"aaaa");
        assert_eq!(back.file_exists(s, "/b").unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_corrupt_root_falls_back() {
        let config = small_config();
        let engine = StorageEngine::new(&config).unwrap();
        let mut image = encode(&engine);
        image[1024 + 256] = 9; // root kind byte
        let back = decode(&image, &config).unwrap();
        assert_eq!(back.tree().len(), 1);
        assert!(back.tree().entry(back.tree().root()).unwrap().is_dir());
    }

    #[test]
    fn test_header_errors_are_fatal() {
        let config = small_config();
        assert_eq!(
            decode(b"short", &config).unwrap_err().code(),
            ErrorCode::IoError
        );
        let mut image = encode(&StorageEngine::new(&config).unwrap());
        image[..8].copy_from_slice(b"NOTOMNI!");
        assert_eq!(
            decode(&image, &config).unwrap_err().code(),
            ErrorCode::InvalidConfig
        );
    }

    #[test]
    fn test_oversized_geometry_is_rejected() {
        let config = small_config();
        let image = encode(&StorageEngine::new(&config).unwrap());

        // 2^50 one-byte blocks
        let mut huge_grid = image.clone();
        huge_grid[12..20].copy_from_slice(&(1u64 << 50).to_le_bytes());
        huge_grid[28..36].copy_from_slice(&1u64.to_le_bytes());
        assert_eq!(
            decode(&huge_grid, &config).unwrap_err().code(),
            ErrorCode::InvalidConfig
        );
        assert_eq!(
            report::ContainerReport::from_image(&huge_grid).unwrap_err().code(),
            ErrorCode::InvalidConfig
        );

        let mut huge_table = image.clone();
        huge_table[160..164].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            decode(&huge_table, &config).unwrap_err().code(),
            ErrorCode::InvalidConfig
        );

        let mut inverted = image;
        inverted[12..20].copy_from_slice(&100u64.to_le_bytes());
        assert_eq!(
            decode(&inverted, &config).unwrap_err().code(),
            ErrorCode::InvalidConfig
        );
    }

    #[test]
    fn test_cut_inside_user_table_is_rejected() {
        let config = small_config();
        let image = encode(&StorageEngine::new(&config).unwrap());
        assert_eq!(
            decode(&image[..512 + 3 * 128], &config).unwrap_err().code(),
            ErrorCode::InvalidConfig
        );
    }

    #[test]
    fn test_payload_tail_is_not_taken_as_bitmap() {
        let config = small_config();
        let mut engine = StorageEngine::new(&config).unwrap();
        let s = engine.login("admin", "admin123").unwrap();
        engine.file_create(s, "/big", &[0u8; 200]).unwrap();
        let image = encode(&engine);

        // stop inside /big's payload so the last 32 bytes are zeroed file data
        let payload_at = 1024 + 420 + ENTRY_SIZE + 4;
        let mut back = decode(&image[..payload_at + 136], &config).unwrap();
        assert_eq!(back.ledger().used_count(), 1);
        assert!(!back.ledger().is_free(0));
        let s = back.login("admin", "admin123").unwrap();
        assert_eq!(back.file_exists(s, "/big").unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_regions_without_bitmap() {
        let config = small_config();
        let header = ContainerHeader::from_config(&config);
        let r = Regions::locate(&header, 1000);
        assert_eq!(r.user_table, 512..1000);
        assert_eq!(r.tree, 1000..1000);
        assert!(r.bitmap.is_none());
    }
}
