//! Builds attestation packages from disclosed attributes.
//!
//! The issuer side of the gateway: given a subject and what they chose to
//! disclose, produce the signals, context data, and proof a verifier with the
//! same scope and endpoint will accept.

use rosca_core::SubjectId;

use crate::hex;
use crate::package::{
    sha256, AttestationPackage, ContextData, DisclosedAttributes, DisclosureSignals, DocumentType,
};
use crate::traits::Prover;

/// Produces packages for one application scope and endpoint.
#[derive(Debug, Clone)]
pub struct DisclosureIssuer<P> {
    prover: P,
    scope: String,
    endpoint: String,
}

impl<P: Prover> DisclosureIssuer<P> {
    /// Issuer bound to `scope` and `endpoint`.
    pub fn new(prover: P, scope: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            prover,
            scope: scope.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Issue a package for `subject`.
    pub fn issue(
        &self,
        document_type: DocumentType,
        subject: &SubjectId,
        attributes: DisclosedAttributes,
    ) -> AttestationPackage {
        let signals = DisclosureSignals {
            scope_hash: hex::encode(&sha256(&self.scope)),
            subject_id: subject.clone(),
            attributes,
        }
        .to_signals();
        let context = ContextData::new(&self.endpoint, subject.clone()).encode();
        let mut package = AttestationPackage {
            document_type,
            proof: Vec::new(),
            public_signals: signals,
            context,
        };
        package.proof = self.prover.prove(&package.statement());
        package
    }
}
