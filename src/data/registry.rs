// ============================================================
// Layer 4 - Regression Dataset Registry
// ============================================================
// The Monash / UEA time-series extrinsic regression archive.
// Each dataset is published as a Zenodo record containing
// {name}.zip with {name}_TRAIN.ts and {name}_TEST.ts inside.
//
// Reference: Tan, Bergmeir, Petitjean & Webb (2020)
//            "Monash University, UEA, UCR Time Series Extrinsic
//             Regression Archive"

use crate::error::{Result, TsError};

const ZENODO_RECORD_URL: &str = "https://zenodo.org/record";

/// (dataset name, Zenodo record id)
const MONASH_REGRESSION: &[(&str, u32)] = &[
    ("AppliancesEnergy",           3902637),
    ("HouseholdPowerConsumption1", 3902704),
    ("HouseholdPowerConsumption2", 3902706),
    ("BenzeneConcentration",       3902673),
    ("BeijingPM25Quality",         3902671),
    ("BeijingPM10Quality",         3902667),
    ("LiveFuelMoistureContent",    4632439),
    ("FloodModeling1",             3902694),
    ("FloodModeling2",             3902696),
    ("FloodModeling3",             3902698),
    ("AustraliaRainfall",          3902654),
    ("PPGDalia",                   3902728),
    ("IEEEPPG",                    3902710),
    ("BIDMCRR",                    3902685),
    ("BIDMCHR",                    3902675),
    ("BIDMCSpO2",                  3902688),
    ("NewsHeadlineSentiment",      3902718),
    ("NewsTitleSentiment",         3902726),
    ("Covid3Month",                3902690),
];

/// Names of every registered regression dataset.
pub fn dataset_names() -> impl Iterator<Item = &'static str> {
    MONASH_REGRESSION.iter().map(|(name, _)| *name)
}

pub fn is_registered(name: &str) -> bool {
    MONASH_REGRESSION.iter().any(|(n, _)| *n == name)
}

/// Download URL of the zip archive for `name`.
pub fn archive_url(name: &str) -> Result<String> {
    MONASH_REGRESSION
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(n, id)| format!("{ZENODO_RECORD_URL}/{id}/files/{n}.zip"))
        .ok_or_else(|| TsError::DatasetNotFound(name.to_string()))
}
