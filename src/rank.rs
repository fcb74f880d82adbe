//! Bounded best-K accumulator for query candidates.

use std::cmp::Ordering;

use crate::options::GeometryKind;

/// A feature that survived the distance and filter cuts.
///
/// Tag pairs stay raw (indices into the owning layer's dictionaries); the
/// driver resolves them only for candidates still ranked when the query
/// finishes, via `tile_idx`/`layer_idx`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub layer_name: String,
    pub kind: GeometryKind,
    pub id: Option<u64>,
    pub tags: Vec<u32>,
    pub lng: f64,
    pub lat: f64,
    pub meters: f64,
    pub tile_idx: usize,
    pub layer_idx: usize,
}

impl Candidate {
    /// Two candidates are duplicates when layer, geometry class, tag pairs,
    /// and — when both carry one — feature ids agree. A feature split across
    /// tile buffers matches itself under this rule.
    fn duplicate_of(&self, other: &Candidate) -> bool {
        self.layer_name == other.layer_name
            && self.kind == other.kind
            && match (self.id, other.id) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
            && self.tags == other.tags
    }
}

/// Fixed-capacity result set ordered by ascending distance.
///
/// Holds exactly `limit` slots; empty slots rank at infinity, so any finite
/// candidate displaces one. Sorting is stable, which keeps first-seen order
/// among equal distances — earlier tiles and features win ties.
pub(crate) struct Ranking {
    slots: Vec<Option<Candidate>>,
    dedupe: bool,
}

impl Ranking {
    pub fn new(limit: usize, dedupe: bool) -> Self {
        Self {
            slots: (0..limit).map(|_| None).collect(),
            dedupe,
        }
    }

    fn meters_of(slot: &Option<Candidate>) -> f64 {
        slot.as_ref().map_or(f64::INFINITY, |c| c.meters)
    }

    pub fn consider(&mut self, candidate: Candidate) {
        if self.dedupe {
            if let Some(existing) = self
                .slots
                .iter_mut()
                .flatten()
                .find(|slot| slot.duplicate_of(&candidate))
            {
                // keep whichever occurrence is closer; ties favor the new
                // one so a same-distance re-observation refreshes the slot
                if candidate.meters <= existing.meters {
                    *existing = candidate;
                    self.resort();
                }
                return;
            }
        }

        let displaces = self
            .slots
            .last()
            .is_some_and(|back| candidate.meters < Self::meters_of(back));
        if displaces {
            let back = self.slots.len() - 1;
            self.slots[back] = Some(candidate);
            self.resort();
        }
    }

    fn resort(&mut self) {
        self.slots.sort_by(|a, b| {
            Self::meters_of(a)
                .partial_cmp(&Self::meters_of(b))
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Ranked candidates, nearest first; empty slots drop out.
    pub fn into_results(self) -> Vec<Candidate> {
        self.slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(layer: &str, meters: f64) -> Candidate {
        Candidate {
            layer_name: layer.to_string(),
            kind: GeometryKind::Point,
            id: None,
            tags: Vec::new(),
            lng: 0.0,
            lat: 0.0,
            meters,
            tile_idx: 0,
            layer_idx: 0,
        }
    }

    #[test]
    fn test_fills_empty_slots_in_order() {
        let mut ranking = Ranking::new(3, false);
        ranking.consider(candidate("a", 30.0));
        ranking.consider(candidate("b", 10.0));
        ranking.consider(candidate("c", 20.0));

        let meters: Vec<f64> = ranking.into_results().iter().map(|c| c.meters).collect();
        assert_eq!(meters, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_far_candidate_is_rejected_when_full() {
        let mut ranking = Ranking::new(2, false);
        ranking.consider(candidate("a", 1.0));
        ranking.consider(candidate("b", 2.0));
        ranking.consider(candidate("c", 5.0));

        let names: Vec<String> = ranking
            .into_results()
            .into_iter()
            .map(|c| c.layer_name)
            .collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_closer_candidate_displaces_the_back_slot() {
        let mut ranking = Ranking::new(2, false);
        ranking.consider(candidate("a", 10.0));
        ranking.consider(candidate("b", 20.0));
        ranking.consider(candidate("c", 15.0));

        let names: Vec<String> = ranking
            .into_results()
            .into_iter()
            .map(|c| c.layer_name)
            .collect();
        assert_eq!(names, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_equal_distances_keep_first_seen_order() {
        let mut ranking = Ranking::new(3, false);
        ranking.consider(candidate("first", 7.0));
        ranking.consider(candidate("second", 7.0));
        ranking.consider(candidate("third", 7.0));

        let names: Vec<String> = ranking
            .into_results()
            .into_iter()
            .map(|c| c.layer_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string()
            ]
        );
    }

    #[test]
    fn test_equal_distance_does_not_displace_a_full_set() {
        let mut ranking = Ranking::new(1, false);
        ranking.consider(candidate("first", 7.0));
        ranking.consider(candidate("late", 7.0));

        let names: Vec<String> = ranking
            .into_results()
            .into_iter()
            .map(|c| c.layer_name)
            .collect();
        assert_eq!(names, vec!["first".to_string()]);
    }

    fn dup(meters: f64, tile_idx: usize) -> Candidate {
        Candidate {
            id: Some(42),
            tags: vec![0, 0],
            tile_idx,
            ..candidate("roads", meters)
        }
    }

    #[test]
    fn test_dedupe_keeps_the_closer_occurrence() {
        let mut ranking = Ranking::new(5, true);
        ranking.consider(dup(120.0, 0));
        ranking.consider(dup(30.0, 1));

        let results = ranking.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].meters, 30.0);
        assert_eq!(results[0].tile_idx, 1);
    }

    #[test]
    fn test_dedupe_drops_the_farther_occurrence() {
        let mut ranking = Ranking::new(5, true);
        ranking.consider(dup(30.0, 0));
        ranking.consider(dup(120.0, 1));

        let results = ranking.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tile_idx, 0);
    }

    #[test]
    fn test_dedupe_off_keeps_both() {
        let mut ranking = Ranking::new(5, false);
        ranking.consider(dup(30.0, 0));
        ranking.consider(dup(120.0, 1));
        assert_eq!(ranking.into_results().len(), 2);
    }

    #[test]
    fn test_ids_disambiguate_otherwise_equal_features() {
        let mut ranking = Ranking::new(5, true);
        ranking.consider(Candidate {
            id: Some(1),
            ..candidate("roads", 10.0)
        });
        ranking.consider(Candidate {
            id: Some(2),
            ..candidate("roads", 20.0)
        });
        assert_eq!(ranking.into_results().len(), 2);
    }

    #[test]
    fn test_missing_id_matches_on_remaining_fields() {
        let mut ranking = Ranking::new(5, true);
        ranking.consider(Candidate {
            id: None,
            ..candidate("roads", 10.0)
        });
        ranking.consider(Candidate {
            id: Some(2),
            ..candidate("roads", 20.0)
        });
        assert_eq!(ranking.into_results().len(), 1);
    }

    #[test]
    fn test_differing_tags_are_not_duplicates() {
        let mut ranking = Ranking::new(5, true);
        ranking.consider(Candidate {
            tags: vec![0, 0],
            ..candidate("roads", 10.0)
        });
        ranking.consider(Candidate {
            tags: vec![0, 1],
            ..candidate("roads", 20.0)
        });
        assert_eq!(ranking.into_results().len(), 2);
    }
}
