use heapless::Vec;
use log::error;

use crate::config::STATUS_MSG_MAX;
use crate::error::{Result, ServerError};

/// Little-endian reader over a received access payload.
pub struct NetBuf<'a> {
    data: &'a [u8],
}

impl<'a> NetBuf<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pull_mem<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.data.len() < N {
            return Err(ServerError::Truncated {
                needed: N,
                remaining: self.data.len(),
            });
        }

        let (head, tail) = self.data.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        self.data = tail;
        Ok(out)
    }

    pub fn pull_u8(&mut self) -> Result<u8> {
        Ok(self.pull_mem::<1>()?[0])
    }

    pub fn pull_le16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.pull_mem()?))
    }

    pub fn pull_le32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.pull_mem()?))
    }

    pub fn pull_le64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.pull_mem()?))
    }
}

/// An outgoing status message: opcode followed by little-endian fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMsg {
    data: Vec<u8, STATUS_MSG_MAX>,
}

impl StatusMsg {
    pub fn new(opcode: u32) -> Self {
        let mut msg = Self { data: Vec::new() };
        if opcode < 0x7F {
            msg.add_u8(opcode as u8);
        } else {
            msg.add_mem(&(opcode as u16).to_be_bytes());
        }
        msg
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn remaining(&self) -> usize {
        self.data.capacity() - self.data.len()
    }

    pub fn add_mem(&mut self, mem: &[u8]) {
        if self.data.extend_from_slice(mem).is_err() {
            error!("Status message overflow, dropping {} bytes", mem.len());
        }
    }

    pub fn add_u8(&mut self, val: u8) {
        self.add_mem(&[val]);
    }

    pub fn add_le16(&mut self, val: u16) {
        self.add_mem(&val.to_le_bytes());
    }

    pub fn add_le32(&mut self, val: u32) {
        self.add_mem(&val.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_fields() {
        let mut buf = NetBuf::new(&[0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);

        assert_eq!(buf.pull_u8(), Ok(0x01));
        assert_eq!(buf.pull_le16(), Ok(0x1234));
        assert_eq!(buf.pull_le32(), Ok(0x12345678));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_pull_truncated() {
        let mut buf = NetBuf::new(&[0x01]);

        assert_eq!(
            buf.pull_le16(),
            Err(ServerError::Truncated {
                needed: 2,
                remaining: 1
            })
        );
        // A failed pull consumes nothing
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_status_opcode_encoding() {
        assert_eq!(StatusMsg::new(0x5E).as_slice(), &[0x5E]);
        assert_eq!(StatusMsg::new(0x8204).as_slice(), &[0x82, 0x04]);
    }

    #[test]
    fn test_status_fields() {
        let mut msg = StatusMsg::new(0x8208);
        msg.add_le16(0xFF9C);
        msg.add_u8(0x42);

        assert_eq!(msg.as_slice(), &[0x82, 0x08, 0x9C, 0xFF, 0x42]);
        assert_eq!(msg.remaining(), STATUS_MSG_MAX - 5);
    }

    #[test]
    fn test_status_overflow_is_dropped() {
        let mut msg = StatusMsg::new(0x5E);
        msg.add_mem(&[0u8; STATUS_MSG_MAX]);

        assert_eq!(msg.as_slice().len(), 1);
    }
}
