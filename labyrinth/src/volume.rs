/// Map a raw control reading onto a perceptually even volume.
///
/// The inverted reading is squared twice, so small turns near the top of the
/// range change the output slowly and the bottom end falls off quickly.
pub fn perceived_volume(measure: u8) -> u8 {
    let inverted = u16::from(255 - measure);
    let squared = (inverted * inverted) >> 8;
    let fourth = (squared * squared) >> 8;
    255 - fourth as u8
}
