//! Raw detector column codes, their readable names, and the PDG codes used
//! to label events.

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const PDGID: &str = "pdgid";
pub const IS_CC: &str = "is_cc";
pub const ENERGY: &str = "energy";

/// Derived: neutrino species name from [`PDGID`].
pub const PARTICLE_NAME: &str = "Particle name";
/// Derived: `false` for charged-current muon-neutrino events (tracks).
pub const IS_SHOWER: &str = "Is shower?";

pub const RAW_TRACK_LIKELIHOOD: &str = "E.trks.lik[:,0]";
pub const RAW_SHOWER_LIKELIHOOD: &str = "E.trks.lik[:,1]";
pub const TRACK_LIKELIHOOD: &str = "Track reconstruction likelyhood";
pub const SHOWER_LIKELIHOOD: &str = "Shower reconstruction likelyhood";
pub const TRACK_X: &str = "Track x-position";
pub const TRACK_Y: &str = "Track y-position";
pub const INELASTICITY: &str = "Inelasticity";

/// Raw instrument code → readable name.
static RENAMES: &[(&str, &str)] = &[
    ("Unnamed: 0", "Run number"),
    ("angle_shfit_gandalf", "Angle between direction of shower and track"),
    ("distance_shfit_gandalf", "Distance between shower and track start"),
    ("dt_shfit_gandalf", "Time difference between shower and track start"),
    (RAW_TRACK_LIKELIHOOD, TRACK_LIKELIHOOD),
    (RAW_SHOWER_LIKELIHOOD, SHOWER_LIKELIHOOD),
    ("E.trks.len[:,0]", "Track length"),
    ("E.trks.dir.x[:,0]", "Track x-direction"),
    ("E.trks.dir.y[:,0]", "Track y-direction"),
    ("E.trks.dir.z[:,0]", "Track z-direction"),
    ("E.trks.pos.x[:,0]", TRACK_X),
    ("E.trks.pos.y[:,0]", TRACK_Y),
    ("E.trks.pos.z[:,0]", "Track z-position"),
    ("E.trks.dir.x[:,1]", "Shower x-direction"),
    ("E.trks.dir.y[:,1]", "Shower y-direction"),
    ("E.trks.dir.z[:,1]", "Shower z-direction"),
    ("E.trks.pos.x[:,1]", "Shower x-position"),
    ("E.trks.pos.y[:,1]", "Shower y-position"),
    ("E.trks.pos.z[:,1]", "Shower z-position"),
    (
        "T.feat_Neutrino2020.cherCond_n_doms",
        "Number of detector spheres with unscattered light signals",
    ),
    (
        "T.feat_Neutrino2020.gandalf_nHits",
        "Number of hits used in track reconstruction",
    ),
    ("T.sum_mc_nu.by", INELASTICITY),
];

/// Readable name for a raw column code. Unknown codes are returned as-is.
pub fn rename(raw: &str) -> &str {
    RENAMES
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
        .unwrap_or(raw)
}

/// Columns kept for training, after renaming and label derivation.
pub const USED_COLUMNS: &[&str] = &[
    "Angle between direction of shower and track",
    "Distance between shower and track start",
    "Time difference between shower and track start",
    TRACK_LIKELIHOOD,
    SHOWER_LIKELIHOOD,
    "Track length",
    "Track x-direction",
    "Track y-direction",
    "Track z-direction",
    TRACK_X,
    TRACK_Y,
    "Track z-position",
    "Shower x-direction",
    "Shower y-direction",
    "Shower z-direction",
    "Shower x-position",
    "Shower y-position",
    "Shower z-position",
    "Number of detector spheres with unscattered light signals",
    "Number of hits used in track reconstruction",
    INELASTICITY,
    IS_CC,
    PARTICLE_NAME,
    IS_SHOWER,
];

// ---------------------------------------------------------------------------
// Particle codes
// ---------------------------------------------------------------------------

pub const MUON_NEUTRINO: i64 = 14;

/// Species name for a PDG identifier, if it is one of the six neutrinos.
pub fn species_name(pdgid: i64) -> Option<&'static str> {
    match pdgid {
        12 => Some("Electron neutrino"),
        14 => Some("Muon neutrino"),
        16 => Some("Tau neutrino"),
        -12 => Some("Anti electron neutrino"),
        -14 => Some("Anti muon neutrino"),
        -16 => Some("Anti tau neutrino"),
        _ => None,
    }
}

/// Charged-current (anti)muon-neutrino events leave a track; everything else
/// is a shower.
pub fn is_shower(pdgid: i64, is_cc: f64) -> bool {
    !(pdgid.unsigned_abs() == MUON_NEUTRINO.unsigned_abs() && is_cc == 1.0)
}
