use rand::Rng;

use crate::error::ModelError;

/// Picks one token using weighted random sampling.
///
/// The probability of selecting a token is proportional to its count
/// relative to `total`, which must equal the sum of the counts yielded
/// by `entries`.
///
/// This performs:
/// - one uniform draw in `[0, total)`
/// - an O(n) scan with cumulative subtraction to select a bucket
///
/// Only the draw supplies randomness: `entries` may come in any order,
/// deterministic or not.
///
/// # Errors
/// Returns `EmptyDistribution` if `total` is zero, or if the entries run
/// out before the draw is consumed (`total` larger than the real sum).
pub(crate) fn weighted_choice<'a, R, I>(rng: &mut R, total: u64, entries: I) -> Result<&'a str, ModelError>
where
	R: Rng + ?Sized,
	I: IntoIterator<Item = (&'a str, u64)>,
{
	if total == 0 {
		return Err(ModelError::EmptyDistribution);
	}

	let mut r = rng.random_range(0..total);
	for (token, occurrence) in entries {
		if r < occurrence {
			return Ok(token);
		}
		r -= occurrence;
	}

	Err(ModelError::EmptyDistribution)
}
