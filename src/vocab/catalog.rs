//! Identifiers and tables that steer the graph-to-dictionary transformation.
//!
//! Everything here is data. [`VocabularyCatalog::ausplots`] assembles the
//! tables for the AusPlots controlled vocabularies; tests assemble their own.

use crate::vocab::aliases::AliasResolver;
use serde::Serialize;

/// Prefix of every AusPlots controlled-vocabulary identifier
pub const AUSPLOTS_CV: &str = "http://linked.data.gov.au/def/ausplots-cv/";

macro_rules! cv {
    ($uuid:literal) => {
        concat!("http://linked.data.gov.au/def/ausplots-cv/", $uuid)
    };
}

pub const CATEGORICAL_VARIABLES_CONTAINER: &str = cv!("55e652ef-b1f9-448a-97d4-a28cfc74e7c4");

pub const BIOREGION_NAME: &str = cv!("a9754a72-c2f7-4a9d-9686-9df78fb65e62");
pub const OBSERVER: &str = cv!("f06cad16-dce2-412a-9e47-1834b483b8db");
pub const STATE: &str = cv!("c27df9ec-ef2a-482c-b79f-22b03efcacd4");
pub const DATUM: &str = cv!("3b2c4499-9257-498d-a18f-6405e5ca8787");

/// Vocabularies used outside the container that still need expanding.
pub const CROSS_REFERENCED: &[&str] = &[BIOREGION_NAME, OBSERVER, STATE];

/// Container members that are never expanded.
pub const IGNORED: &[&str] = &[
    cv!("9dc8290e-ce1f-48b3-a6d3-78acf1f56b7b"), // Miscellaneous
    cv!("1e3327d0-e572-4c6b-8836-b4e226adc089"), // Vegetation strata values
];

/// Vocabularies whose values have no notation and are coded by label.
pub const CODED_BY_LABEL: &[&str] = &[DATUM];

type AliasRow = (&'static str, &'static [(&'static str, Option<&'static str>)]);

pub const ALIASES: &[AliasRow] = &[
    (cv!("e502f1db-b8fe-4e32-9a1a-f761b9e98029"), &[("point_id", None)]),
    (BIOREGION_NAME, &[("bioregion_name", None)]),
    (cv!("5acbf972-3cf2-4516-9a07-1fa1b8a2acbd"), &[("coarse_frag_abund", None)]),
    (cv!("b446ff51-dc76-472e-bb2f-19706a089b32"), &[("coarse_frag_shape", None)]),
    (cv!("9a280139-f00e-45ab-b08e-93e3164b4bd2"), &[("coarse_frag_size", None)]),
    (DATUM, &[("pit_marker_datum", Some("Pit marker datum"))]),
    (cv!("f0f17aeb-8d72-4b17-9a13-f625cdc30c08"), &[("disturbance", None)]),
    (cv!("bca813f6-9182-43a5-8975-8d804cc61b31"), &[("drainage_type", None)]),
    (cv!("aa40dc68-706e-4273-a547-3235def21d1c"), &[("effervescence", None)]),
    (cv!("23609456-c133-452f-a06c-feffbdedd64e"), &[("erosion_abundance", None)]),
    (cv!("0b12c523-e44d-43ab-8b42-976e7d1fac1b"), &[("erosion_state", None)]),
    (cv!("34c89174-82d6-421d-8d08-756292adc465"), &[("erosion_type", None)]),
    (cv!("eae155c7-669c-463a-8d01-01b090472732"), &[("growth_form", None)]),
    (cv!("1a250c12-c95e-401e-9f16-8bce83bd691d"), &[("landform_element", None)]),
    (cv!("4f9e9fa9-5327-45fa-9ab2-be81e7a2a89c"), &[("landform_pattern", None)]),
    (
        cv!("cb0c2aab-6556-4344-9d5d-5bd0ecab2267"),
        &[
            ("outcrop_lithology", Some("Outcrop lithology")),
            ("other_outcrop_lithology", Some("Other outcrop lithology")),
        ],
    ),
    (
        cv!("5b18e191-31f1-459b-90a0-31ee3f614846"),
        &[("pit_marker_mga_zones", Some("Pit marker MGA zone"))],
    ),
    (cv!("222c85bc-a6f7-4e78-87ef-9684f513bcc6"), &[("microrelief", None)]),
    (cv!("16b85cbf-7956-4131-bf21-2d9e7a08cb96"), &[("mottles_abundance", None)]),
    (cv!("c9c9d4df-6342-45b8-ab99-b07496cadf1b"), &[("mottles_colour", None)]),
    (cv!("b512f19f-f659-4e32-b9a0-18aa72c25333"), &[("mottles_size", None)]),
    (
        OBSERVER,
        &[
            ("observer_veg", Some("Observer veg")),
            ("observer_soil", Some("Observer soil")),
            ("described_by", Some("Described by")),
            ("collected_by", Some("Collected by")),
        ],
    ),
    (cv!("009e5822-4344-4b5a-832b-46a3adcf042f"), &[("pedality_fabric", None)]),
    (cv!("c8029ec5-940f-48cc-b3d1-50cadf3dc2fd"), &[("pedality_grade", None)]),
    (cv!("337b09de-0b39-43d8-b2f0-417e1085bf2e"), &[("pedality_type", None)]),
    (cv!("32ce77a0-dc9e-459b-9c91-4da904dbe7d6"), &[("segregations_abundance", None)]),
    (cv!("2ecd0e04-d5cd-4748-849a-ff6810567835"), &[("segregations_form", None)]),
    (cv!("a58f8f2e-6067-48af-b0f7-c8c19c811ba2"), &[("segregations_nature", None)]),
    (cv!("b2e65552-b85a-4c01-a953-7934bd65b84f"), &[("segregations_size", None)]),
    (cv!("0968f477-fe5d-4c90-b4b3-71a41bcba3e2"), &[("texture_grade", None)]),
    (cv!("55775cfc-eb1c-4151-904a-1654a2649799"), &[("texture_modifier", None)]),
    (cv!("a7258bee-8f9f-4f0f-ae77-a5def5c22936"), &[("texture_qualifier", None)]),
    (STATE, &[("state", None)]),
    (
        cv!("d6f16e28-0913-4b06-9919-c13d9a9f0832"),
        &[
            ("smallest_size_1", Some("Smallest Size 1")),
            ("smallest_size_2", Some("Smallest Size 2")),
        ],
    ),
    (cv!("b15f3b2b-99dd-4ec4-b1ad-15ee7ed1658e"), &[("substrate", None)]),
    (cv!("9be3370e-6bce-4418-a4f5-ba3800951344"), &[("surface_soil_condition", None)]),
    (cv!("fc51058d-ab4b-4875-9655-7356d1b6a009"), &[("surface_strew_size", None)]),
];

/// Free-text and numeric variables: defined in the vocabulary, no values.
pub const NON_VOCAB: &[(&str, &str)] = &[
    (cv!("5ff6bc93-0d26-420f-80de-a898d51962aa"), "basal_area"),
    (cv!("cde9be44-f208-4411-9f16-9dab96d4c425"), "climatic_condition"),
    (cv!("aa11e5f7-aec2-4e92-95b8-6332911f0c4e"), "colour_when_dry"),
    (cv!("7d6a1fdb-111a-4dbe-8534-a5e48d79750c"), "colour_when_moist"),
    (cv!("2ec446bb-a098-4016-9fca-80c667597bbe"), "dead"),
    (cv!("85a6a2b1-51e4-4fe4-9792-da54423ba3cf"), "ec"),
    (cv!("8b217978-1aec-4e4a-ac9d-b08a47ebf0a4"), "height"),
    (cv!("7f3ca1bc-ba41-49b6-adb9-05e640f89d79"), "horizon"),
    (cv!("bc8156c2-c2a7-4b2b-8ece-3f1959734d6e"), "in_canopy_sky"),
    (cv!("11eb41e9-4f8f-4998-8443-e2748d8081a0"), "lower_depth"),
    (cv!("7903d149-6fcd-4038-928c-4987b00e451e"), "mass_flowering_event"),
    (cv!("e8bde3f7-0c4f-442e-8e88-08273f57fec8"), "ground_1_dominant"),
    (cv!("e9aa8f39-4fb9-49fc-b48b-861c22d57971"), "ground_2_dominant"),
    (cv!("3e1d9d34-023a-47ae-9b2c-e07eeaaea2ce"), "ground_3_dominant"),
    (cv!("9f770911-7b5c-45c8-b35f-f6dbc7840659"), "mid_1_dominant"),
    (cv!("53f39410-6e5c-4555-81b4-ce0d48b22166"), "mid_2_dominant"),
    (cv!("d99a8ef8-bcac-4496-b3e6-5d0391e0c7c9"), "mid_3_dominant"),
    (cv!("69ed5cf9-e617-4f4a-bb13-899351317e52"), "upper_1_dominant"),
    (cv!("ef5bc0c0-8e17-4d33-a019-6c86c6ce7df0"), "upper_2_dominant"),
    (cv!("91d40b5f-aec1-4812-8277-a35af77c3caa"), "upper_3_dominant"),
    (cv!("686c8e7b-78ab-4094-8a38-733eefe21e0a"), "ph"),
    (cv!("b6049501-b90f-4ab0-b64b-dff4f588e3e4"), "site_aspect"),
    (cv!("8ad3966c-9f23-4df9-9c37-5b8cee679356"), "site_slope"),
    (cv!("ff69c254-e549-45e8-a320-e28ead5092c8"), "vegetation_condition"),
];

/// Variables produced by the downstream R package. No external definition
/// exists for them, so they are defined here.
pub const DOMAIN_ONLY: &[(&str, &str)] = &[
    ("authorship", "standardised author of taxonomic name from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("family", "plant family from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("genus", "plant genus from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("genus_species", "species level scientific name matched to the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("hits_unique", "unique point intercept hit identifier concatenation of transect and point_number"),
    ("infraspecific_epithet", "epithet or name identifying infraspecific taxon matched to the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("infraspecific_rank", "rank of infraspecific taxon matched to the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("published_in", "taxonomic publication details from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("rank", "lowest applicable taxonomic rank from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("site_unique", "unique site survey identifier concatenation of site_location_name and site_location_visit_ID"),
    ("specific_epithet", "epithet or name identifying species matched to the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("standardised_name", "scientific name at lowest available taxonomic level matched to the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("taxa_group", "major plant taxonomic group from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
    ("taxa_status", "flag for accepted plant name from the Australian Plant Census (APC) and Australian Plant Names Index (APNI)"),
];

/// A variable defined by a single vocabulary entity with no enumerated values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonVocabVariable {
    pub id: String,
    pub code: String,
}

/// A variable with a hand-written definition and no vocabulary entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainVariable {
    pub code: String,
    pub definition: String,
}

/// All static inputs of one dictionary build
#[derive(Debug, Clone, Default)]
pub struct VocabularyCatalog {
    pub container_id: String,
    pub cross_referenced: Vec<String>,
    pub ignored: Vec<String>,
    pub coded_by_label: Vec<String>,
    pub aliases: AliasResolver,
    pub non_vocab: Vec<NonVocabVariable>,
    pub domain_only: Vec<DomainVariable>,
}

impl VocabularyCatalog {
    /// An empty catalog reading variables from `container_id`
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            ..Default::default()
        }
    }

    /// The AusPlots tables with the default container
    pub fn ausplots() -> Self {
        Self {
            container_id: CATEGORICAL_VARIABLES_CONTAINER.to_string(),
            cross_referenced: owned(CROSS_REFERENCED),
            ignored: owned(IGNORED),
            coded_by_label: owned(CODED_BY_LABEL),
            aliases: AliasResolver::from_rows(ALIASES.iter().copied()),
            non_vocab: NON_VOCAB
                .iter()
                .map(|(id, code)| NonVocabVariable {
                    id: (*id).to_string(),
                    code: (*code).to_string(),
                })
                .collect(),
            domain_only: DOMAIN_ONLY
                .iter()
                .map(|(code, definition)| DomainVariable {
                    code: (*code).to_string(),
                    definition: (*definition).to_string(),
                })
                .collect(),
        }
    }

    pub fn with_container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = container_id.into();
        self
    }

    pub fn with_cross_referenced(mut self, id: impl Into<String>) -> Self {
        self.cross_referenced.push(id.into());
        self
    }

    pub fn with_ignored(mut self, id: impl Into<String>) -> Self {
        self.ignored.push(id.into());
        self
    }

    pub fn with_coded_by_label(mut self, id: impl Into<String>) -> Self {
        self.coded_by_label.push(id.into());
        self
    }

    pub fn with_aliases(mut self, aliases: AliasResolver) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_non_vocab(mut self, id: impl Into<String>, code: impl Into<String>) -> Self {
        self.non_vocab.push(NonVocabVariable {
            id: id.into(),
            code: code.into(),
        });
        self
    }

    pub fn with_domain_only(
        mut self,
        code: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        self.domain_only.push(DomainVariable {
            code: code.into(),
            definition: definition.into(),
        });
        self
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored.iter().any(|ignored| ignored == id)
    }
}

fn owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_string()).collect()
}
