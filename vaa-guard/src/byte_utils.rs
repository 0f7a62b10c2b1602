use crate::error::{MalformedVaa, VaaField};

/// Big-endian reader over a byte slice. Every read names the field it is reading so a short
/// input reports which field ran off the end.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn get_const_bytes<const N: usize>(
        &mut self,
        field: VaaField,
    ) -> Result<[u8; N], MalformedVaa> {
        let end = self
            .pos
            .checked_add(N)
            .filter(|end| *end <= self.data.len())
            .ok_or(MalformedVaa::truncated(field))?;

        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;

        Ok(bytes)
    }

    pub fn get_u8(&mut self, field: VaaField) -> Result<u8, MalformedVaa> {
        self.get_const_bytes::<1>(field).map(|b| b[0])
    }

    pub fn get_u16(&mut self, field: VaaField) -> Result<u16, MalformedVaa> {
        self.get_const_bytes(field).map(u16::from_be_bytes)
    }

    pub fn get_u32(&mut self, field: VaaField) -> Result<u32, MalformedVaa> {
        self.get_const_bytes(field).map(u32::from_be_bytes)
    }

    pub fn get_u64(&mut self, field: VaaField) -> Result<u64, MalformedVaa> {
        self.get_const_bytes(field).map(u64::from_be_bytes)
    }

    /// Everything not read yet.
    pub fn rest(self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}
