//! Sampling strategies

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reco_bench_core::{RequestParams, SamplingStrategy};

use crate::domains::ParameterDomains;

const MAX_PREALLOC: usize = 1 << 16;

/// Produces the ordered list of parameter sets for a run
#[derive(Debug, Clone)]
pub struct ParameterSampler {
    domains: ParameterDomains,
    seed: Option<u64>,
}

impl ParameterSampler {
    /// Create a sampler over `domains`
    pub fn new(domains: ParameterDomains) -> Self {
        Self {
            domains,
            seed: None,
        }
    }

    /// Seed the random strategy for reproducible runs
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Domains being sampled
    pub fn domains(&self) -> &ParameterDomains {
        &self.domains
    }

    /// Most parameter sets `strategy` can produce; `None` when unbounded
    pub fn upper_bound(&self, strategy: SamplingStrategy) -> Option<usize> {
        if self.domains.addresses.is_empty() || self.domains.language_tags.is_empty() {
            return Some(0);
        }
        match strategy {
            SamplingStrategy::Cartesian => Some(self.domains.cartesian_size()),
            SamplingStrategy::Random | SamplingStrategy::Stratified => None,
        }
    }

    /// Draw `min(max_requests, upper_bound)` parameter sets
    pub fn sample(&self, strategy: SamplingStrategy, max_requests: usize) -> Vec<RequestParams> {
        let limit = match self.upper_bound(strategy) {
            Some(bound) => bound.min(max_requests),
            None => max_requests,
        };
        if limit == 0 {
            return Vec::new();
        }

        let sampled = match strategy {
            SamplingStrategy::Cartesian => self.cartesian(limit),
            SamplingStrategy::Random => self.random(limit),
            SamplingStrategy::Stratified => self.stratified(limit),
        };

        tracing::debug!(
            strategy = %strategy,
            requested = max_requests,
            produced = sampled.len(),
            "Sampled parameter sets"
        );
        sampled
    }

    /// Fixed-order enumeration; the bare required-only set leads each pair
    fn cartesian(&self, limit: usize) -> Vec<RequestParams> {
        let d = &self.domains;
        let time_slots = optional(&d.time_slots);
        let scenes = optional(&d.scenes);
        let moods = optional(&d.moods);
        let restrictions = d.restriction_options();

        let mut out = Vec::with_capacity(limit);
        for address in &d.addresses {
            for language_tag in &d.language_tags {
                for &time_slot in &time_slots {
                    for &scene in &scenes {
                        for &mood in &moods {
                            for restriction in &restrictions {
                                out.push(RequestParams {
                                    address: address.clone(),
                                    time_slot: time_slot.cloned(),
                                    scene: scene.cloned(),
                                    mood: mood.cloned(),
                                    restrictions: restriction.clone(),
                                    language_tag: language_tag.clone(),
                                });
                                if out.len() >= limit {
                                    return out;
                                }
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// Independent draws; each optional field present with probability 1/2
    fn random(&self, limit: usize) -> Vec<RequestParams> {
        let d = &self.domains;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut out = Vec::with_capacity(limit.min(MAX_PREALLOC));
        for _ in 0..limit {
            let (Some(address), Some(language_tag)) =
                (d.addresses.choose(&mut rng), d.language_tags.choose(&mut rng))
            else {
                break;
            };
            let mut params = RequestParams::new(address.clone(), language_tag.clone());

            if rng.gen_bool(0.5) {
                params.time_slot = d.time_slots.choose(&mut rng).cloned();
            }
            if rng.gen_bool(0.5) {
                params.scene = d.scenes.choose(&mut rng).cloned();
            }
            if rng.gen_bool(0.5) {
                params.mood = d.moods.choose(&mut rng).cloned();
            }
            if rng.gen_bool(0.5) {
                if let Some(combo) = d.restrictions.choose(&mut rng) {
                    params = params.with_restrictions(combo.iter().cloned());
                }
            }
            out.push(params);
        }
        out
    }

    /// Rotates address fastest, then language tag; optional fields follow
    /// the low four bits of the index
    fn stratified(&self, limit: usize) -> Vec<RequestParams> {
        let d = &self.domains;
        let addresses = d.addresses.len();
        let tags = d.language_tags.len();

        (0..limit)
            .map(|i| {
                let mut params = RequestParams::new(
                    d.addresses[i % addresses].clone(),
                    d.language_tags[(i / addresses) % tags].clone(),
                );
                let variation = i % 16;

                if variation & 0b0001 != 0 {
                    params.time_slot = pick(&d.time_slots, i).cloned();
                }
                if variation & 0b0010 != 0 {
                    params.scene = pick(&d.scenes, i).cloned();
                }
                if variation & 0b0100 != 0 {
                    params.mood = pick(&d.moods, i).cloned();
                }
                if variation & 0b1000 != 0 {
                    if let Some(combo) = pick(&d.restrictions, i) {
                        params = params.with_restrictions(combo.iter().cloned());
                    }
                }
                params
            })
            .collect()
    }
}

/// Convenience wrapper around [`ParameterSampler::sample`]
pub fn sample(
    domains: &ParameterDomains,
    strategy: SamplingStrategy,
    max_requests: usize,
    seed: Option<u64>,
) -> Vec<RequestParams> {
    ParameterSampler::new(domains.clone())
        .with_seed(seed)
        .sample(strategy, max_requests)
}

fn optional(values: &[String]) -> Vec<Option<&String>> {
    std::iter::once(None).chain(values.iter().map(Some)).collect()
}

fn pick<T>(values: &[T], i: usize) -> Option<&T> {
    if values.is_empty() {
        None
    } else {
        values.get(i % values.len())
    }
}
