use anyhow::{bail, Context};
use fleetcore::wire::{encode_frame, WireRecord};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::net::SocketAddr;

/// Configuration for the synthetic vehicle feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub bind: SocketAddr,
    pub interval_ms: u64,
    pub vehicles: usize,
    pub seed: u64,
    pub origin_lat: f64,
    pub origin_lng: f64,
    /// Spread of the initial positions around the origin, in degrees.
    pub spread_deg: f64,
    /// Per-frame GPS noise amplitude, in degrees.
    pub jitter_deg: f64,
    /// Per-frame travel of a moving vehicle, in degrees.
    pub step_deg: f64,
    pub moving_ratio: f64,
    /// Drop each connection after this many frames to exercise reconnects.
    pub close_after: Option<usize>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            interval_ms: 1_000,
            vehicles: 200,
            seed: 0,
            origin_lat: 37.5,
            origin_lng: -122.0,
            spread_deg: 0.05,
            jitter_deg: 0.000_01,
            step_deg: 0.000_2,
            moving_ratio: 0.6,
            close_after: None,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.moving_ratio) {
            bail!("moving_ratio must lie in [0, 1], got {}", self.moving_ratio);
        }
        if self.jitter_deg < 0.0 || self.step_deg < 0.0 || self.spread_deg < 0.0 {
            bail!("jitter_deg, step_deg and spread_deg must be non-negative");
        }
        i32::try_from(self.vehicles).context("vehicle count exceeds the wire id range")?;
        Ok(())
    }
}

struct Vehicle {
    id: i32,
    lat: f64,
    lng: f64,
    heading: f64,
    moving: bool,
    status: u8,
}

/// Seeded random walk over a fleet of vehicles.
pub struct FleetGenerator {
    config: FeedConfig,
    rng: StdRng,
    vehicles: Vec<Vehicle>,
}

impl FleetGenerator {
    pub fn new(config: FeedConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let vehicles = (0..config.vehicles)
            .map(|index| Vehicle {
                id: index as i32 + 1,
                lat: config.origin_lat + rng.gen_range(-1.0..=1.0) * config.spread_deg,
                lng: config.origin_lng + rng.gen_range(-1.0..=1.0) * config.spread_deg,
                heading: rng.gen_range(0.0..TAU),
                moving: rng.gen_bool(config.moving_ratio),
                status: 1,
            })
            .collect();

        Ok(Self {
            config,
            rng,
            vehicles,
        })
    }

    pub fn next_records(&mut self) -> Vec<WireRecord> {
        let jitter = self.config.jitter_deg;
        let step = self.config.step_deg;
        let mut records = Vec::with_capacity(self.vehicles.len());

        for vehicle in &mut self.vehicles {
            if vehicle.moving {
                vehicle.heading += self.rng.gen_range(-0.3..=0.3);
                vehicle.lat += step * vehicle.heading.sin();
                vehicle.lng += step * vehicle.heading.cos();
            }
            if self.rng.gen_bool(0.02) {
                vehicle.status = self.rng.gen_range(0..4);
            }
            let noise_lat = self.rng.gen_range(-1.0..=1.0) * jitter;
            let noise_lng = self.rng.gen_range(-1.0..=1.0) * jitter;
            records.push(WireRecord::new(
                vehicle.id,
                vehicle.lat + noise_lat,
                vehicle.lng + noise_lng,
                vehicle.status,
            ));
        }
        records
    }

    pub fn next_frame(&mut self) -> Vec<u8> {
        encode_frame(&self.next_records())
    }
}
