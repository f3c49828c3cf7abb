//! Internet checksum (RFC 1071).

/// Computes the 16-bit Internet checksum of `data`.
///
/// The buffer is summed as big-endian 16-bit words; a trailing odd byte is
/// the high byte of a zero-padded final word. Carries are folded back into
/// the low 16 bits and the one's complement of the result is returned.
///
/// Writing the result into a zeroed checksum field makes a later checksum
/// over the whole buffer come out as zero.
pub fn checksum(mut data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    while data.len() >= 2 {
        sum = sum.wrapping_add(u16::from_be_bytes([data[0], data[1]]) as u32);
        data = &data[2..];
    }
    if let [last] = data {
        sum = sum.wrapping_add((*last as u32) << 8);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Returns true when `data`, checksum field included, sums to zero.
pub fn verify(data: &[u8]) -> bool {
    checksum(data) == 0
}
