/// A `u16` stored in network byte order, so that it can live inside `#[repr(C, packed)]` wire
/// structs.
#[derive(Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub(crate) struct Be16(u16);

impl Be16 {
    #[inline]
    pub(crate) fn get(self) -> u16 {
        u16::from_be(self.0)
    }
}

impl From<u16> for Be16 {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value.to_be())
    }
}
