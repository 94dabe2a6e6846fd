//! Material-subset range notation on technique annotations.
//!
//! A subset string scopes a technique to particular material indices:
//! comma-separated pieces, each either a literal index (`3`) or an
//! inclusive range (`2-4`). An omitted upper bound (`5-`) means the
//! material count supplied by the caller.

/// Returns true when `index` is a member of the `subset` string.
///
/// Malformed pieces never match; they do not poison their neighbours.
pub fn contains_subset(subset: &str, index: u32, material_count: u32) -> bool {
    subset.split(',').any(|piece| piece_contains(piece.trim(), index, material_count))
}

fn piece_contains(piece: &str, index: u32, material_count: u32) -> bool {
    match piece.split_once('-') {
        None => piece.parse::<u32>() == Ok(index),
        Some((lo, hi)) => {
            let Ok(lo) = lo.trim().parse::<u32>() else {
                return false;
            };
            let hi = match hi.trim() {
                "" => material_count,
                s => match s.parse::<u32>() {
                    Ok(n) => n,
                    Err(_) => return false,
                },
            };
            lo <= index && index <= hi
        }
    }
}
