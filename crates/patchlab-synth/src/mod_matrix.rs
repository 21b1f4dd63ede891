//! Modulation matrix for flexible parameter routing.
//!
//! Routes named sources into named destinations with a signed per-route
//! amount. Sources and destinations are closed enums so every pairing is
//! handled by an exhaustive match; there is no string lookup at runtime.
//!
//! Resolution rules:
//!
//! - disabled routes contribute exactly 0
//! - every destination receives `sum(source * amount)` over its routes, scaled
//!   by the destination's [`span`](ModDestination::span), added to the base
//!   value and clamped to the destination's legal [`range`](ModDestination::range)
//! - the sum is formed in a canonical order, so slot order never changes the result
//! - routes that would form a cycle between modulation sources are ignored and
//!   reported as [`RouteConflict`]s

use patchlab_core::ParamRange;
use serde::{Deserialize, Serialize};

/// Modulation source identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModSource {
    /// LFO 1 (-depth to depth)
    #[default]
    Lfo1,
    /// LFO 2 (-depth to depth)
    Lfo2,
    /// Amplitude envelope (0 to 1)
    AmpEnvelope,
    /// Filter envelope (0 to 1)
    FilterEnvelope,
    /// Pitch envelope (0 to 1)
    PitchEnvelope,
    /// Modulation envelope (0 to 1)
    ModEnvelope,
    /// Pulse-width envelope (0 to 1)
    PwmEnvelope,
    /// Note-on velocity (0 to 1)
    Velocity,
    /// Key tracking (-1 to 1, centered at middle C)
    KeyTrack,
    /// Mod wheel (0 to 1)
    ModWheel,
}

impl ModSource {
    /// Number of sources.
    pub const COUNT: usize = 10;

    /// Every source, in evaluation order.
    pub const ALL: [ModSource; Self::COUNT] = [
        ModSource::Lfo1,
        ModSource::Lfo2,
        ModSource::AmpEnvelope,
        ModSource::FilterEnvelope,
        ModSource::PitchEnvelope,
        ModSource::ModEnvelope,
        ModSource::PwmEnvelope,
        ModSource::Velocity,
        ModSource::KeyTrack,
        ModSource::ModWheel,
    ];

    /// Dense index into per-source arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// LFO slot this source reads, if it is an LFO.
    #[inline]
    pub fn lfo_index(self) -> Option<usize> {
        match self {
            ModSource::Lfo1 => Some(0),
            ModSource::Lfo2 => Some(1),
            _ => None,
        }
    }
}

/// Modulation destination identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModDestination {
    /// Oscillator pitch in semitones
    Pitch,
    /// Filter cutoff frequency in Hz
    #[default]
    FilterCutoff,
    /// Filter resonance (Q)
    FilterResonance,
    /// Amplitude / VCA level
    Amplitude,
    /// Pan position
    Pan,
    /// Pulse width of the main oscillator
    PulseWidth,
    /// Noise level
    NoiseLevel,
    /// Second oscillator level
    Osc2Level,
    /// FM modulation index
    ModulationIndex,
    /// FM modulator-to-carrier ratio
    Harmonicity,
    /// Additive spectral tilt
    Brightness,
    /// LFO 1 rate in Hz
    Lfo1Rate,
    /// LFO 1 depth
    Lfo1Depth,
    /// LFO 2 rate in Hz
    Lfo2Rate,
    /// LFO 2 depth
    Lfo2Depth,
}

impl ModDestination {
    /// Number of destinations.
    pub const COUNT: usize = 15;

    /// Every destination.
    pub const ALL: [ModDestination; Self::COUNT] = [
        ModDestination::Pitch,
        ModDestination::FilterCutoff,
        ModDestination::FilterResonance,
        ModDestination::Amplitude,
        ModDestination::Pan,
        ModDestination::PulseWidth,
        ModDestination::NoiseLevel,
        ModDestination::Osc2Level,
        ModDestination::ModulationIndex,
        ModDestination::Harmonicity,
        ModDestination::Brightness,
        ModDestination::Lfo1Rate,
        ModDestination::Lfo1Depth,
        ModDestination::Lfo2Rate,
        ModDestination::Lfo2Depth,
    ];

    /// Dense index into per-destination arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Destination units per unit of summed modulation.
    ///
    /// A route with amount 1.0 and a full-scale source moves the destination
    /// by exactly one span.
    pub fn span(self) -> f32 {
        match self {
            ModDestination::Pitch => 12.0,
            ModDestination::FilterCutoff => 5000.0,
            ModDestination::FilterResonance => 10.0,
            ModDestination::Amplitude => 1.0,
            ModDestination::Pan => 1.0,
            ModDestination::PulseWidth => 0.45,
            ModDestination::NoiseLevel => 1.0,
            ModDestination::Osc2Level => 1.0,
            ModDestination::ModulationIndex => 20.0,
            ModDestination::Harmonicity => 4.0,
            ModDestination::Brightness => 1.0,
            ModDestination::Lfo1Rate | ModDestination::Lfo2Rate => 10.0,
            ModDestination::Lfo1Depth | ModDestination::Lfo2Depth => 1.0,
        }
    }

    /// Legal range of the modulated value.
    pub fn range(self) -> ParamRange {
        match self {
            ModDestination::Pitch => ParamRange::new(-48.0, 48.0, 0.0),
            ModDestination::FilterCutoff => ParamRange::new(20.0, 20000.0, 1000.0),
            ModDestination::FilterResonance => ParamRange::new(0.0, 30.0, 1.0),
            ModDestination::Amplitude => ParamRange::new(0.0, 1.0, 1.0),
            ModDestination::Pan => ParamRange::BIPOLAR,
            ModDestination::PulseWidth => ParamRange::new(0.05, 0.95, 0.5),
            ModDestination::NoiseLevel | ModDestination::Osc2Level => ParamRange::UNIT,
            ModDestination::ModulationIndex => ParamRange::new(0.0, 100.0, 10.0),
            ModDestination::Harmonicity => ParamRange::new(0.1, 20.0, 3.0),
            ModDestination::Brightness => ParamRange::BIPOLAR,
            ModDestination::Lfo1Rate | ModDestination::Lfo2Rate => {
                ParamRange::new(0.01, 50.0, 1.0)
            }
            ModDestination::Lfo1Depth | ModDestination::Lfo2Depth => ParamRange::UNIT,
        }
    }

    /// The modulation source whose output this destination changes, if any.
    ///
    /// Routing a source into a destination that feeds back into the same
    /// source forms a cycle.
    pub fn influences(self) -> Option<ModSource> {
        match self {
            ModDestination::Lfo1Rate | ModDestination::Lfo1Depth => Some(ModSource::Lfo1),
            ModDestination::Lfo2Rate | ModDestination::Lfo2Depth => Some(ModSource::Lfo2),
            _ => None,
        }
    }
}

/// A single modulation route.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModRoute {
    /// Source of modulation
    pub source: ModSource,
    /// Destination parameter
    pub destination: ModDestination,
    /// Modulation amount (-1.0 to 1.0, negative inverts)
    pub amount: f32,
    /// Disabled routes contribute nothing
    pub enabled: bool,
}

impl Default for ModRoute {
    fn default() -> Self {
        Self {
            source: ModSource::Lfo1,
            destination: ModDestination::FilterCutoff,
            amount: 0.0,
            enabled: false,
        }
    }
}

impl ModRoute {
    /// Create an enabled route, clamping the amount.
    pub fn new(source: ModSource, destination: ModDestination, amount: f32) -> Self {
        Self {
            source,
            destination,
            amount: ParamRange::BIPOLAR.clamp(amount),
            enabled: true,
        }
    }

    /// Same route with `enabled` set.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Clamp the amount into [-1, 1].
    pub fn sanitized(mut self) -> Self {
        self.amount = ParamRange::BIPOLAR.clamp(self.amount);
        self
    }
}

/// Where a route came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteOrigin {
    /// A modulation matrix slot.
    Slot(usize),
    /// An LFO's fixed `destination` field, expressed as an implicit route.
    LfoDirect(usize),
}

/// A route ignored because it would form a modulation cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteConflict {
    /// Origin of the ignored route.
    pub origin: RouteOrigin,
    /// The route as configured.
    pub route: ModRoute,
}

/// Container for current modulation source values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModulationValues {
    values: [f32; ModSource::COUNT],
}

impl ModulationValues {
    /// Create new modulation values with all sources at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get value for a specific source.
    #[inline]
    pub fn get(&self, source: ModSource) -> f32 {
        self.values[source.index()]
    }

    /// Set value for a specific source.
    #[inline]
    pub fn set(&mut self, source: ModSource, value: f32) {
        self.values[source.index()] = value;
    }

    /// Set key tracking from a MIDI note number.
    ///
    /// Centers at middle C (note 60), -1 to 1 over five octaves either side.
    pub fn set_key_track_from_note(&mut self, note: u8) {
        self.set(
            ModSource::KeyTrack,
            ((f32::from(note) - 60.0) / 60.0).clamp(-1.0, 1.0),
        );
    }
}

/// Per-destination modulation sums for one voice and tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedModulation {
    sums: [f32; ModDestination::COUNT],
}

impl Default for ResolvedModulation {
    fn default() -> Self {
        Self {
            sums: [0.0; ModDestination::COUNT],
        }
    }
}

impl ResolvedModulation {
    /// Normalized sum `Σ(source × amount)` for a destination.
    #[inline]
    pub fn sum(&self, destination: ModDestination) -> f32 {
        self.sums[destination.index()]
    }

    /// Modulation delta in destination units.
    #[inline]
    pub fn delta(&self, destination: ModDestination) -> f32 {
        self.sum(destination) * destination.span()
    }

    /// Modulated value: `base + delta`, clamped to the destination range.
    #[inline]
    pub fn apply(&self, destination: ModDestination, base: f32) -> f32 {
        destination.range().clamp(base + self.delta(destination))
    }

    /// Add an extra normalized contribution to a destination.
    #[inline]
    pub fn add(&mut self, destination: ModDestination, amount: f32) {
        self.sums[destination.index()] += amount;
    }
}

/// Modulation matrix with a fixed number of routing slots.
///
/// Built from a parameter snapshot's routes with [`from_routes`](Self::from_routes);
/// the engine rebuilds it only when the snapshot changes, so resolving is a
/// short loop over pre-validated routes.
///
/// # Example
///
/// ```rust
/// use patchlab_synth::{ModDestination, ModRoute, ModSource, ModulationMatrix, ModulationValues};
///
/// let routes = [
///     ModRoute::new(ModSource::Lfo1, ModDestination::FilterCutoff, 0.5),
///     ModRoute::new(ModSource::FilterEnvelope, ModDestination::FilterCutoff, 0.25),
/// ];
/// let (matrix, conflicts) = ModulationMatrix::<4>::from_routes(&routes);
/// assert!(conflicts.is_empty());
///
/// let mut values = ModulationValues::new();
/// values.set(ModSource::Lfo1, 1.0);
/// values.set(ModSource::FilterEnvelope, 0.5);
///
/// let resolved = matrix.resolve(&values);
/// assert!((resolved.sum(ModDestination::FilterCutoff) - 0.625).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct ModulationMatrix<const N: usize> {
    /// Active, acyclic routes in canonical summation order
    routes: [Option<ModRoute>; N],
    route_count: usize,
    /// LFO slots in dependency order
    lfo_order: [usize; 2],
}

impl<const N: usize> Default for ModulationMatrix<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ModulationMatrix<N> {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self {
            routes: [None; N],
            route_count: 0,
            lfo_order: [0, 1],
        }
    }

    /// Build a matrix from matrix-slot routes.
    ///
    /// Routes beyond capacity `N` are dropped. Returns the matrix and any
    /// routes ignored for forming a cycle.
    pub fn from_routes(routes: &[ModRoute]) -> (Self, Vec<RouteConflict>) {
        let tagged: Vec<(RouteOrigin, ModRoute)> = routes
            .iter()
            .enumerate()
            .map(|(i, r)| (RouteOrigin::Slot(i), *r))
            .collect();
        Self::from_tagged(&tagged)
    }

    /// Build a matrix from routes with explicit origins.
    ///
    /// Accepted routes beyond capacity `N` are dropped in input order, so the
    /// earliest slots always survive.
    pub fn from_tagged(routes: &[(RouteOrigin, ModRoute)]) -> (Self, Vec<RouteConflict>) {
        let enabled: Vec<(RouteOrigin, ModRoute)> = routes
            .iter()
            .filter(|(_, r)| r.enabled)
            .map(|(o, r)| (*o, r.sanitized()))
            .collect();

        // Edges between LFO sources: lfo_edges[from][to]
        let mut lfo_edges = [[false; 2]; 2];
        for (_, route) in &enabled {
            if let (Some(from), Some(to)) = (
                route.source.lfo_index(),
                route.destination.influences().and_then(ModSource::lfo_index),
            ) {
                lfo_edges[from][to] = true;
            }
        }
        let mutual = lfo_edges[0][1] && lfo_edges[1][0];

        let mut conflicts = Vec::new();
        let mut accepted: Vec<ModRoute> = Vec::with_capacity(enabled.len());
        for (origin, route) in enabled {
            let target = route.destination.influences().and_then(ModSource::lfo_index);
            let cyclic = match (route.source.lfo_index(), target) {
                (Some(from), Some(to)) => from == to || mutual,
                _ => false,
            };
            if cyclic {
                conflicts.push(RouteConflict { origin, route });
            } else {
                accepted.push(route);
            }
        }

        if accepted.len() > N {
            tracing::debug!(
                dropped = accepted.len() - N,
                capacity = N,
                "modulation routes over capacity"
            );
            accepted.truncate(N);
        }

        // Canonical order makes the floating-point sum independent of slot order
        accepted.sort_by(|a, b| {
            a.destination
                .cmp(&b.destination)
                .then(a.source.cmp(&b.source))
                .then(a.amount.total_cmp(&b.amount))
        });

        let mut matrix = Self::new();
        for route in accepted {
            matrix.routes[matrix.route_count] = Some(route);
            matrix.route_count += 1;
        }
        matrix.lfo_order = if !mutual && lfo_edges[1][0] {
            [1, 0]
        } else {
            [0, 1]
        };

        (matrix, conflicts)
    }

    /// Get number of active routes.
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    /// Get maximum number of routes.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Iterate over active routes.
    pub fn iter(&self) -> impl Iterator<Item = &ModRoute> {
        self.routes[..self.route_count]
            .iter()
            .filter_map(|r| r.as_ref())
    }

    /// LFO slots ordered so that an LFO modulating another is evaluated first.
    pub fn lfo_order(&self) -> [usize; 2] {
        self.lfo_order
    }

    /// Calculate total modulation for a single destination.
    pub fn get_modulation(&self, destination: ModDestination, sources: &ModulationValues) -> f32 {
        self.iter()
            .filter(|r| r.destination == destination)
            .map(|r| sources.get(r.source) * r.amount)
            .sum()
    }

    /// Resolve every destination at once.
    #[inline]
    pub fn resolve(&self, sources: &ModulationValues) -> ResolvedModulation {
        let mut resolved = ResolvedModulation::default();
        for route in self.iter() {
            resolved.add(route.destination, sources.get(route.source) * route.amount);
        }
        resolved
    }
}
