/// Indexed value for a pixel nothing was drawn to.
pub const TRANSPARENT: u16 = 0xFFFF;

/// Turns palette indexes into 0xAARRGGBB pixels.
pub trait VideoDecoder {
    fn decode_frame(&self, indexed: &[u16], out: &mut [u32]);
}

/// 2C02 colours, 0xRRGGBB.
const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, //
    0x202A00, 0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, //
    0x989698, 0x084CC4, 0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, //
    0x545A00, 0x287200, 0x087C00, 0x007628, 0x006678, 0x000000, 0x000000, 0x000000, //
    0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC, 0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, //
    0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88, 0x404040, 0x000000, 0x000000, //
    0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4, 0xEC9CB4, 0xE4B090, //
    0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000, 0x000000, //
];

#[derive(Default)]
pub struct DefaultVideoDecoder {}

impl DefaultVideoDecoder {
    pub fn new() -> Self {
        Self {}
    }

    pub fn decode_pixel(index: u16) -> u32 {
        if index == TRANSPARENT {
            0
        } else {
            0xFF000000 | NES_PALETTE_RGB[(index & 0x3F) as usize]
        }
    }
}

impl VideoDecoder for DefaultVideoDecoder {
    fn decode_frame(&self, indexed: &[u16], out: &mut [u32]) {
        for (pixel, index) in out.iter_mut().zip(indexed) {
            *pixel = Self::decode_pixel(*index);
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::{DefaultVideoDecoder, VideoDecoder, TRANSPARENT};

    #[test]
    fn test_decode_frame() {
        let mut out = [0x12345678; 4];
        DefaultVideoDecoder::new().decode_frame(&[0x00, 0x30, 0x4F, TRANSPARENT], &mut out);

        assert_eq!([0xFF545454, 0xFFECEEEC, 0xFF000000, 0x00000000], out);
    }
}
