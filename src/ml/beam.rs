// ============================================================
// Layer 5 — Beam Search
// ============================================================
// Maintains the top-k (`beam_width`) hypotheses at each decoding
// step. Scores are summed token log-probabilities, compared after
// length normalisation so longer sequences are not punished for
// accumulating more negative terms.
//
// With early stopping enabled, a hypothesis that emits [EOS] is
// frozen and carried forward unchanged; decoding ends once every
// beam is frozen or the length budget runs out. With it disabled,
// [EOS] is an ordinary token and beams run to the full budget.
//
// Decoding is fully deterministic: candidate ordering breaks
// score ties by token sequence, so a fixed model and fixed
// parameters always produce the same answer.
//
// Reference: Freitag & Al-Onaizan (2017) Beam Search Strategies
//            for Neural Machine Translation

/// A single beam hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamHypothesis {
    /// Token ids generated so far (starts with the start token)
    pub tokens: Vec<u32>,
    /// Sum of token log-probabilities
    pub score: f32,
    /// Whether this hypothesis reached [EOS] (frozen)
    pub is_done: bool,
}

impl BeamHypothesis {
    pub fn new(tokens: Vec<u32>, score: f32) -> Self {
        Self { tokens, score, is_done: false }
    }

    /// Length-normalised score used for ranking.
    pub fn normalized_score(&self, length_penalty: f32) -> f32 {
        let len = self.tokens.len() as f32;
        self.score / len.powf(length_penalty)
    }
}

/// Beam search decoder state machine. The caller owns the decode
/// loop (it needs the model); this type owns hypothesis expansion
/// and ranking.
pub struct BeamSearch {
    beam_width:     usize,
    length_penalty: f32,
    early_stopping: bool,
    eos_token_id:   u32,
}

impl BeamSearch {
    pub fn new(beam_width: usize, eos_token_id: u32) -> Self {
        assert!(beam_width > 0, "beam width must be at least 1");
        Self {
            beam_width,
            length_penalty: 1.0,
            early_stopping: false,
            eos_token_id,
        }
    }

    /// Set length penalty (>1 favors longer sequences).
    pub fn with_length_penalty(mut self, penalty: f32) -> Self {
        self.length_penalty = penalty;
        self
    }

    /// Freeze hypotheses on [EOS] and stop once all beams are frozen.
    pub fn with_early_stopping(mut self) -> Self {
        self.early_stopping = true;
        self
    }

    /// Initialize with a single start-token hypothesis.
    pub fn init(&self, start_token: u32) -> Vec<BeamHypothesis> {
        vec![BeamHypothesis::new(vec![start_token], 0.0)]
    }

    /// Advance one step. Each live hypothesis comes paired with the
    /// log-probs the model assigned to its next token; frozen
    /// hypotheses carry an empty slice and pass through unchanged.
    pub fn step(&self, expansions: Vec<(BeamHypothesis, Vec<f32>)>) -> Vec<BeamHypothesis> {
        let mut candidates: Vec<BeamHypothesis> = Vec::new();

        for (beam, log_probs) in expansions {
            if beam.is_done {
                candidates.push(beam);
                continue;
            }

            // Only the top beam_width continuations of one hypothesis
            // can survive the global cut, so expanding further is wasted
            let mut ranked: Vec<(u32, f32)> = log_probs
                .iter()
                .enumerate()
                .map(|(id, &lp)| (id as u32, lp))
                .collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            ranked.truncate(self.beam_width);

            for (token_id, token_score) in ranked {
                let mut new_tokens = beam.tokens.clone();
                new_tokens.push(token_id);

                let mut new_beam = BeamHypothesis::new(new_tokens, beam.score + token_score);
                if self.early_stopping && token_id == self.eos_token_id {
                    new_beam.is_done = true;
                }
                candidates.push(new_beam);
            }
        }

        // Keep the top beam_width by normalised score; ties broken by
        // token sequence so the result is deterministic
        candidates.sort_by(|a, b| {
            b.normalized_score(self.length_penalty)
                .partial_cmp(&a.normalized_score(self.length_penalty))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tokens.cmp(&b.tokens))
        });
        candidates.truncate(self.beam_width);
        candidates
    }

    /// True once every hypothesis is frozen.
    pub fn all_done(&self, beams: &[BeamHypothesis]) -> bool {
        !beams.is_empty() && beams.iter().all(|b| b.is_done)
    }

    /// The best hypothesis by normalised score.
    pub fn best<'a>(&self, beams: &'a [BeamHypothesis]) -> Option<&'a BeamHypothesis> {
        beams.iter().max_by(|a, b| {
            a.normalized_score(self.length_penalty)
                .partial_cmp(&b.normalized_score(self.length_penalty))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.tokens.cmp(&a.tokens))
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const EOS: u32 = 3;

    fn expansions(beams: &[BeamHypothesis], log_probs: &[f32]) -> Vec<(BeamHypothesis, Vec<f32>)> {
        beams
            .iter()
            .map(|b| (b.clone(), if b.is_done { vec![] } else { log_probs.to_vec() }))
            .collect()
    }

    #[test]
    fn test_keeps_top_beam_width() {
        let bs    = BeamSearch::new(2, EOS);
        let beams = bs.init(0);
        // vocab of 4: token 2 best, then token 1
        let next = bs.step(expansions(&beams, &[-3.0, -1.0, -0.5, -4.0]));
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].tokens, vec![0, 2]);
        assert_eq!(next[1].tokens, vec![0, 1]);
    }

    #[test]
    fn test_scores_accumulate() {
        let bs    = BeamSearch::new(1, EOS);
        let beams = bs.init(0);
        let beams = bs.step(expansions(&beams, &[-1.0, -2.0]));
        let beams = bs.step(expansions(&beams, &[-1.5, -2.5]));
        assert_eq!(beams[0].tokens, vec![0, 0, 0]);
        assert!((beams[0].score - (-2.5)).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let run = || {
            let bs = BeamSearch::new(3, EOS).with_early_stopping();
            let mut beams = bs.init(0);
            for _ in 0..5 {
                beams = bs.step(expansions(&beams, &[-1.0, -0.7, -0.7, -2.0, -1.3]));
                if bs.all_done(&beams) {
                    break;
                }
            }
            bs.best(&beams).unwrap().tokens.clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_eos_freezes_hypothesis_with_early_stopping() {
        let bs    = BeamSearch::new(1, EOS).with_early_stopping();
        let beams = bs.init(0);
        // EOS (id 3) is the best token
        let beams = bs.step(expansions(&beams, &[-2.0, -2.0, -2.0, -0.1]));
        assert!(beams[0].is_done);
        assert!(bs.all_done(&beams));

        // A frozen hypothesis passes through later steps unchanged
        let after = bs.step(expansions(&beams, &[]));
        assert_eq!(after, beams);
    }

    #[test]
    fn test_eos_is_ordinary_without_early_stopping() {
        let bs    = BeamSearch::new(1, EOS);
        let beams = bs.step(expansions(&bs.init(0), &[-2.0, -2.0, -2.0, -0.1]));
        assert_eq!(*beams[0].tokens.last().unwrap(), EOS);
        assert!(!beams[0].is_done);
        assert!(!bs.all_done(&beams));
    }

    #[test]
    fn test_length_penalty_changes_ranking() {
        let short = BeamHypothesis { tokens: vec![0, 1], score: -1.0, is_done: true };
        let long  = BeamHypothesis { tokens: vec![0, 1, 2, 4], score: -1.6, is_done: true };

        // Neutral penalty: per-token average favors the long hypothesis
        let neutral = BeamSearch::new(2, EOS).with_length_penalty(1.0);
        assert_eq!(neutral.best(&[short.clone(), long.clone()]).unwrap().tokens, long.tokens);

        // No normalisation: raw sum favors the short hypothesis
        let raw = BeamSearch::new(2, EOS).with_length_penalty(0.0);
        assert_eq!(raw.best(&[short.clone(), long]).unwrap().tokens, short.tokens);
    }

    #[test]
    #[should_panic]
    fn test_zero_beam_width_panics() {
        let _ = BeamSearch::new(0, EOS);
    }
}
