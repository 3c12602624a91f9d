//! Track fitting: fills each leg of a journey with tracks whose summed
//! duration approximates the leg's travel time.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Leg, Mood, Track, TrackWithFeatures};

pub const ENERGY_THRESHOLD: f32 = 0.6;
pub const DANCEABILITY_THRESHOLD: f32 = 0.7;
pub const DEFAULT_POPULARITY_THRESHOLD: u32 = 50;

/// A single track overshooting what remains by less than this ends the leg
const BEST_FIT_SLACK_SECS: i64 = 20;

/// Picks tracks from `pool` until `target_secs` is covered.
///
/// Selected tracks are removed from `pool`. When some track is at least as
/// long as what remains and overshoots it by under 20 seconds, that track is
/// taken and the leg is done. Otherwise the last track of the pool is taken,
/// so the pool is expected to be shuffled beforehand.
pub fn fit_tracks(pool: &mut Vec<TrackWithFeatures>, target_secs: i64) -> Vec<Track> {
    let mut remaining = target_secs;
    let mut selected = Vec::new();

    while remaining > 0 {
        let best_fit = pool
            .iter()
            .enumerate()
            .map(|(index, candidate)| (index, candidate.track.duration_secs() - remaining))
            .filter(|(_, diff)| *diff >= 0)
            .min_by_key(|(_, diff)| *diff);

        if let Some((index, diff)) = best_fit {
            if diff < BEST_FIT_SLACK_SECS {
                selected.push(pool.remove(index).track);
                return selected;
            }
        }

        let Some(candidate) = pool.pop() else {
            break;
        };
        remaining -= candidate.track.duration_secs();
        selected.push(candidate.track);
    }

    selected
}

/// Disjoint track pools, one per mood
#[derive(Debug, Default)]
pub struct MoodPools {
    low_energy: Vec<TrackWithFeatures>,
    danceable: Vec<TrackWithFeatures>,
}

impl MoodPools {
    /// Sorts candidates into pools and shuffles each pool. Tracks that are
    /// energetic but not danceable fit neither pool and are dropped.
    pub fn partition<R: Rng + ?Sized>(tracks: Vec<TrackWithFeatures>, rng: &mut R) -> Self {
        let mut pools = MoodPools::default();
        for candidate in tracks {
            let features = candidate.features;
            if features.energy < ENERGY_THRESHOLD {
                pools.low_energy.push(candidate);
            } else if features.danceability > DANCEABILITY_THRESHOLD {
                pools.danceable.push(candidate);
            }
        }
        pools.low_energy.shuffle(rng);
        pools.danceable.shuffle(rng);
        tracing::debug!(
            low_energy = pools.low_energy.len(),
            danceable = pools.danceable.len(),
            "Built mood pools"
        );
        pools
    }

    pub fn pool_mut(&mut self, mood: Mood) -> &mut Vec<TrackWithFeatures> {
        match mood {
            Mood::LowEnergy => &mut self.low_energy,
            Mood::Danceable => &mut self.danceable,
        }
    }

    pub fn len(&self, mood: Mood) -> usize {
        match mood {
            Mood::LowEnergy => self.low_energy.len(),
            Mood::Danceable => self.danceable.len(),
        }
    }

    /// Fits every leg in order from the pool its mode asks for. Pools are
    /// shared, so a track used for one leg is gone for the next ones.
    pub fn fit_legs(&mut self, legs: &[Leg]) -> Vec<Track> {
        let mut tracks = Vec::new();
        for leg in legs {
            let target = leg.travel_duration_secs as i64;
            let fitted = fit_tracks(self.pool_mut(leg.mode.mood()), target);
            let fitted_secs: i64 = fitted.iter().map(Track::duration_secs).sum();
            tracing::info!(
                mode = ?leg.mode,
                target_secs = target,
                fitted_secs,
                count = fitted.len(),
                "Fitted leg"
            );
            tracks.extend(fitted);
        }
        tracks
    }
}

/// Keeps tracks strictly more popular than `threshold`
pub fn popular_only(tracks: Vec<TrackWithFeatures>, threshold: u32) -> Vec<TrackWithFeatures> {
    tracks
        .into_iter()
        .filter(|candidate| candidate.track.popularity > threshold)
        .collect()
}
