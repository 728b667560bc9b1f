//! Free-block bitmap over the container's block grid.
//!
//! One bit per block, LSB first within each byte, 1 = used. The ledger only
//! accounts for the fixed metadata region; file payloads are held in the
//! namespace tree and never allocate blocks here.

/// Occupancy bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBlockLedger {
    total_blocks: u64,
    bits: Vec<u8>,
}

impl FreeBlockLedger {
    /// All blocks free.
    pub fn new(total_blocks: u64) -> Self {
        Self {
            total_blocks,
            bits: vec![0; crate::codec::layout::bitmap_len(total_blocks)],
        }
    }

    /// Rebuild from persisted bytes. Missing trailing bytes read as free;
    /// surplus bytes are dropped.
    pub fn from_bytes(total_blocks: u64, bytes: &[u8]) -> Self {
        let mut ledger = Self::new(total_blocks);
        let n = ledger.bits.len().min(bytes.len());
        ledger.bits[..n].copy_from_slice(&bytes[..n]);
        ledger
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    fn locate(&self, block: u64) -> Option<(usize, u8)> {
        (block < self.total_blocks).then(|| ((block / 8) as usize, 1u8 << (block % 8)))
    }

    /// Out-of-range blocks are ignored.
    pub fn mark_used(&mut self, block: u64) {
        if let Some((byte, mask)) = self.locate(block) {
            self.bits[byte] |= mask;
        }
    }

    /// Out-of-range blocks are ignored.
    pub fn mark_free(&mut self, block: u64) {
        if let Some((byte, mask)) = self.locate(block) {
            self.bits[byte] &= !mask;
        }
    }

    /// Out-of-range blocks are never free.
    pub fn is_free(&self, block: u64) -> bool {
        match self.locate(block) {
            Some((byte, mask)) => self.bits[byte] & mask == 0,
            None => false,
        }
    }

    /// First-fit scan for `n` contiguous free blocks.
    pub fn find_run(&self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        let mut run_start = 0;
        let mut run_len = 0;
        for block in 0..self.total_blocks {
            if self.is_free(block) {
                if run_len == 0 {
                    run_start = block;
                }
                run_len += 1;
                if run_len == n {
                    return Some(run_start);
                }
            } else {
                run_len = 0;
            }
        }
        None
    }

    pub fn used_count(&self) -> u64 {
        (0..self.total_blocks).filter(|&b| !self.is_free(b)).count() as u64
    }

    pub fn free_count(&self) -> u64 {
        self.total_blocks - self.used_count()
    }
}
