//! Two-point crossover predicate.

/// True when `a` just crossed over `b`: `a[-2] < b[-2]` and `a[-1] > b[-1]`.
///
/// Ties, NaN and series shorter than two values never signal.
pub fn crossover<A, B>(a: A, b: B) -> bool
where
    A: AsRef<[f64]>,
    B: AsRef<[f64]>,
{
    let (a, b) = (a.as_ref(), b.as_ref());
    if a.len() < 2 || b.len() < 2 {
        return false;
    }
    let (a_prev, a_last) = (a[a.len() - 2], a[a.len() - 1]);
    let (b_prev, b_last) = (b[b.len() - 2], b[b.len() - 1]);
    a_prev < b_prev && a_last > b_last
}
