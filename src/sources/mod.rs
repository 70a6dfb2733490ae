//! Built-in data sources
//!
//! Each GraphQL source is a static definition: the upstream resource, where
//! its records live, the embedded query document and the route it is served
//! on. [`Puller`] turns a [`PullRequest`] into flattened rows.

mod pull;

pub use pull::{
    parse_date, parse_id_list, widen_date_range, PullFilters, PullOutput, PullRequest, Puller,
    END_TIME_VARIABLE, START_TIME_VARIABLE,
};

use crate::error::{Error, Result};
use crate::graphql::QueryDescriptor;
use crate::pagination::PageTarget;
use crate::types::{JsonValue, Record, RecordsLayout};
use crate::tabular::append_utc_offset_column;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a built-in GraphQL source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Daily campaign-group performance
    CampaignGroupInsights,
    /// Daily campaign performance
    CampaignInsights,
    /// Advertiser delivery at a chosen granularity
    AdvertiserDeliveryStats,
    /// Conversion attribution paths
    ConversionJourney,
}

/// Static description of a source
#[derive(Debug)]
pub struct SourceDefinition {
    /// Kind
    pub kind: SourceKind,
    /// CLI / config name
    pub name: &'static str,
    /// HTTP route serving this source
    pub route: &'static str,
    /// Top-level field under `data`
    pub resource: &'static str,
    /// Records container layout
    pub layout: RecordsLayout,
    /// GraphQL document
    pub document: &'static str,
    /// One-line description
    pub description: &'static str,
}

static SOURCES: [SourceDefinition; 4] = [
    SourceDefinition {
        kind: SourceKind::CampaignGroupInsights,
        name: "campaign-group-insights",
        route: "/campaignGroupInsights",
        resource: "campaignGroupInsight",
        layout: RecordsLayout::Nested,
        document: include_str!("queries/campaign_group_insights.graphql"),
        description: "Campaign group settings, pacing and metrics per day",
    },
    SourceDefinition {
        kind: SourceKind::CampaignInsights,
        name: "campaign-insights",
        route: "/campaignInsights",
        resource: "campaignInsight",
        layout: RecordsLayout::Nested,
        document: include_str!("queries/campaign_insights.graphql"),
        description: "Campaign status and metrics per day",
    },
    SourceDefinition {
        kind: SourceKind::AdvertiserDeliveryStats,
        name: "advertiser-delivery-stats",
        route: "/advertiserDeliveryStats",
        resource: "advertiserDelivery",
        layout: RecordsLayout::Nested,
        document: include_str!("queries/advertiser_delivery_stats.graphql"),
        description: "Advertiser delivery metrics at the requested granularity",
    },
    SourceDefinition {
        kind: SourceKind::ConversionJourney,
        name: "conversion-journey",
        route: "/conversionJourney",
        resource: "conversionPath",
        layout: RecordsLayout::Direct,
        document: include_str!("queries/conversion_journey.graphql"),
        description: "Conversion paths with first/last touch stats",
    },
];

impl SourceKind {
    /// All built-in sources
    pub fn all() -> impl Iterator<Item = SourceKind> {
        SOURCES.iter().map(|s| s.kind)
    }

    /// Static definition of this source
    pub fn definition(self) -> &'static SourceDefinition {
        match self {
            SourceKind::CampaignGroupInsights => &SOURCES[0],
            SourceKind::CampaignInsights => &SOURCES[1],
            SourceKind::AdvertiserDeliveryStats => &SOURCES[2],
            SourceKind::ConversionJourney => &SOURCES[3],
        }
    }

    /// Where pages of this source keep their nodes
    pub fn page_target(self) -> PageTarget {
        let def = self.definition();
        PageTarget::new(def.resource, def.layout)
    }

    /// Build the query descriptor: document, date window and source filters
    pub fn descriptor(
        self,
        start_time: String,
        end_time: String,
        filters: &PullFilters,
    ) -> Result<QueryDescriptor> {
        let descriptor = QueryDescriptor::new(self.definition().document)
            .variable(START_TIME_VARIABLE, start_time)
            .variable(END_TIME_VARIABLE, end_time);

        match self {
            SourceKind::CampaignGroupInsights | SourceKind::CampaignInsights => Ok(descriptor),
            SourceKind::AdvertiserDeliveryStats => {
                let granularity = filters
                    .granularity
                    .as_deref()
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .ok_or_else(|| {
                        Error::invalid_input("granularity", "required for advertiser delivery")
                    })?;
                Ok(descriptor.variable("granularity", granularity.to_uppercase()))
            }
            SourceKind::ConversionJourney => Ok(descriptor
                .variable("campaignIds", JsonValue::from(filters.campaign_ids.clone()))
                .variable("trackerIds", JsonValue::from(filters.tracker_ids.clone()))),
        }
    }

    /// Source-specific columns added after flattening
    pub fn post_process(self, rows: &mut [Record]) {
        if self == SourceKind::ConversionJourney {
            append_utc_offset_column(
                rows,
                "conversionStats_conversionTime",
                "timeDifferenceFromUTCinMins",
            );
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SOURCES
            .iter()
            .find(|def| def.name == s || def.resource == s)
            .map(|def| def.kind)
            .ok_or_else(|| Error::invalid_input("source", format!("unknown source '{s}'")))
    }
}

#[cfg(test)]
mod tests;
