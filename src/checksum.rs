/// The OPC-N2 histogram checksum: sum of all bin counts, modulo 2^16.
pub(crate) fn histogram_checksum(bins: &[u16]) -> u16 {
    let mut sum: u16 = 0;
    for bin in bins.iter().copied() {
        sum = sum.wrapping_add(bin);
    }
    sum
}
