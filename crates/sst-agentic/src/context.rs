//! # Pipeline Context
//!
//! The context grows by one borrowed stage output per step:
//!
//! ```text
//! EvaluationContext ──▶ TechnicalContext<'_> ──▶ LegalContext<'_>
//!   company, date         + technical              + legal
//! ```
//!
//! Each stage sees exactly the fields it needs, immutably. No stage can
//! reach back and change an earlier stage's result.

use chrono::NaiveDate;

use sst_core::CompanyId;
use sst_exposure::TechnicalExposureResult;

use crate::agents::LegalAssessment;

/// Input of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    /// Company being evaluated.
    pub company_id: CompanyId,
    /// Day the evaluation represents.
    pub reference_date: NaiveDate,
}

impl EvaluationContext {
    /// Build a context.
    pub fn new(company_id: CompanyId, reference_date: NaiveDate) -> Self {
        Self {
            company_id,
            reference_date,
        }
    }

    /// Extend with the technical stage's output.
    pub fn with_technical<'a>(&'a self, technical: &'a TechnicalExposureResult) -> TechnicalContext<'a> {
        TechnicalContext {
            base: self,
            technical,
        }
    }
}

/// Context after the technical stage.
#[derive(Debug, Clone, Copy)]
pub struct TechnicalContext<'a> {
    /// The run's input.
    pub base: &'a EvaluationContext,
    /// Exposure evaluation.
    pub technical: &'a TechnicalExposureResult,
}

impl<'a> TechnicalContext<'a> {
    /// Extend with the legal stage's output.
    pub fn with_legal(self, legal: &'a LegalAssessment) -> LegalContext<'a> {
        LegalContext {
            base: self.base,
            technical: self.technical,
            legal,
        }
    }
}

/// Context after the legal stage.
#[derive(Debug, Clone, Copy)]
pub struct LegalContext<'a> {
    /// The run's input.
    pub base: &'a EvaluationContext,
    /// Exposure evaluation.
    pub technical: &'a TechnicalExposureResult,
    /// Legal assessment.
    pub legal: &'a LegalAssessment,
}
