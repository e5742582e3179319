//! Region reconciliation planning - no IO, fully testable.
//!
//! A location report's region-membership snapshot (`inregions`) is the
//! client's view of where it currently is. When that view disagrees with the
//! stored fence, a transition was missed (network loss, GPS gap) and the
//! engine synthesizes it here.

/// A transition the client never reported but the snapshot implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// The stored fence is stale; the user is no longer inside it.
    Leave,
    /// The user is inside a region no enter was seen for.
    Enter(String),
}

/// Plan the corrections implied by a location report.
///
/// With a snapshot present: no corrections unless the fix is accurate and
/// the stored fence is absent from the snapshot. A stale stored fence yields
/// a leave; afterwards, a non-empty snapshot yields an enter into its first
/// region (first-wins when the client reports several at once).
///
/// Without a snapshot: only meaningful for clients known to send them
/// (`supported`), where absence means "inside no region" - a stored fence
/// then yields a leave, again only on an accurate fix.
pub fn plan(
    current_fence: &str,
    inregions: Option<&[String]>,
    supported: bool,
    accurate: bool,
) -> Vec<Correction> {
    let mut corrections = Vec::new();

    match inregions {
        Some(regions) => {
            let in_region = regions.iter().any(|r| r == current_fence);
            if !accurate || in_region {
                return corrections;
            }
            // The stored fence (if any) is stale; after the leave the user
            // is outside everything, so a non-empty snapshot implies an
            // unreported enter.
            if !current_fence.is_empty() {
                corrections.push(Correction::Leave);
            }
            if let Some(first) = regions.first() {
                corrections.push(Correction::Enter(first.clone()));
            }
        }
        None => {
            if supported && !current_fence.is_empty() && accurate {
                corrections.push(Correction::Leave);
            }
        }
    }

    corrections
}
