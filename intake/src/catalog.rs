//! Fixed choices offered by the feedback form.

use crate::submission::KNOWN_KINDS;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormCatalog {
    pub types: Vec<FormOption>,
    /// Several areas may be picked for one submission.
    pub categories: Vec<FormOption>,
}

pub const AREAS: [FormOption; 5] = [
    FormOption {
        value: "Confort",
        label: "Confort",
    },
    FormOption {
        value: "Atención",
        label: "Calidad de Atención",
    },
    FormOption {
        value: "Médicos",
        label: "Cuerpo Médico",
    },
    FormOption {
        value: "Limpieza",
        label: "Servicios Básicos",
    },
    FormOption {
        value: "Otros",
        label: "Otro",
    },
];

impl FormCatalog {
    pub fn new() -> Self {
        let types = KNOWN_KINDS
            .iter()
            .map(|&value| FormOption {
                value,
                label: value,
            })
            .collect();

        Self {
            types,
            categories: AREAS.to_vec(),
        }
    }
}

impl Default for FormCatalog {
    fn default() -> Self {
        Self::new()
    }
}
