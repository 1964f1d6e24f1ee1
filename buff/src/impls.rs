use crate::AsBytes;

macro_rules! number_impls {
    ($($type:ty),+) => {
        $(
            impl AsBytes for $type {
                type Repr = [u8; ::std::mem::size_of::<$type>()];

                fn serialize(&self) -> Self::Repr {
                    self.to_be_bytes()
                }

                fn deserialize(src: Self::Repr) -> Self {
                    Self::from_be_bytes(src)
                }
            }
        )+
    }
}

number_impls![u8, u16, u32, u64, i8, i16, i32, i64];
