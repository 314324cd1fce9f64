use crate::model::leave_request::LeaveRequest;
use crate::model::person::{KeyMaterial, Person};
use derive_more::Display;
use ed25519_dalek::{Signer, SigningKey};

pub const ED25519: &str = "ed25519";

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SigningError {
    #[display(fmt = "invalid key: {}", _0)]
    InvalidKey(String),
    #[display(fmt = "unsupported key algorithm: {}", _0)]
    UnsupportedAlgorithm(String),
    #[display(fmt = "signature failure: {}", _0)]
    SignatureFailure(String),
}

impl std::error::Error for SigningError {}

/// Produces a signature over `payload` with a person's stored key.
pub trait KeyedSigner: Send + Sync {
    fn sign(&self, key: &KeyMaterial, payload: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Signs with Ed25519 keys stored as 32 byte seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signer;

impl KeyedSigner for Ed25519Signer {
    fn sign(&self, key: &KeyMaterial, payload: &[u8]) -> Result<Vec<u8>, SigningError> {
        if !key.algorithm.eq_ignore_ascii_case(ED25519) {
            return Err(SigningError::UnsupportedAlgorithm(key.algorithm.clone()));
        }

        let seed: [u8; 32] = key.bytes.as_slice().try_into().map_err(|_| {
            SigningError::InvalidKey(format!("expected 32 byte seed, got {}", key.bytes.len()))
        })?;

        let signing_key = SigningKey::from_bytes(&seed);
        let signature = signing_key
            .try_sign(payload)
            .map_err(|e| SigningError::SignatureFailure(e.to_string()))?;

        Ok(signature.to_bytes().to_vec())
    }
}

/// Bytes attested by a signature: the subject's last name, the submission
/// day and the category key. Other request fields are not covered.
pub fn signature_payload(subject: &Person, request: &LeaveRequest) -> Vec<u8> {
    let submitted = request
        .submitted_at
        .map(|at| at.date_naive().to_string())
        .unwrap_or_default();

    format!(
        "{}{}{}",
        subject.last_name, submitted, request.category.message_key
    )
    .into_bytes()
}

/// Signs `request` with `signer`'s key, failing when none is stored.
pub fn sign_request(
    signer: &dyn KeyedSigner,
    actor: &Person,
    subject: &Person,
    request: &LeaveRequest,
) -> Result<Vec<u8>, SigningError> {
    let key = actor
        .key_material
        .as_ref()
        .ok_or_else(|| SigningError::InvalidKey(format!("person {} has no key", actor.id)))?;

    signer.sign(key, &signature_payload(subject, request))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::leave_request::LeaveStatus;
    use crate::model::leave_request::tests::request;
    use crate::model::role::Role;
    use ed25519_dalek::{Signature, Verifier};

    pub(crate) fn seeded_key(seed: u8) -> KeyMaterial {
        KeyMaterial::new(ED25519, vec![seed; 32])
    }

    #[test]
    fn signature_verifies_with_matching_public_key() {
        let key = seeded_key(42);
        let payload = b"smith2022-02-01holiday";

        let bytes = Ed25519Signer.sign(&key, payload).unwrap();

        let verifying_key = SigningKey::from_bytes(&[42; 32]).verifying_key();
        let signature = Signature::from_slice(&bytes).unwrap();
        assert!(verifying_key.verify(payload, &signature).is_ok());
    }

    #[test]
    fn rejects_foreign_algorithms_and_short_keys() {
        let rsa = KeyMaterial::new("RSA", vec![1; 32]);
        assert!(matches!(
            Ed25519Signer.sign(&rsa, b"x"),
            Err(SigningError::UnsupportedAlgorithm(_))
        ));

        let short = KeyMaterial::new(ED25519, vec![1; 12]);
        assert!(matches!(
            Ed25519Signer.sign(&short, b"x"),
            Err(SigningError::InvalidKey(_))
        ));
    }

    #[test]
    fn payload_covers_last_name_submission_day_and_category() {
        let subject = Person::new(10, "sandra", "Smith", vec![Role::User]);
        let leave = request(LeaveStatus::Waiting);

        assert_eq!(
            signature_payload(&subject, &leave),
            b"Smith2022-02-01holiday".to_vec()
        );
    }

    #[test]
    fn missing_key_is_an_invalid_key() {
        let subject = Person::new(10, "sandra", "Smith", vec![Role::User]);
        let leave = request(LeaveStatus::Waiting);

        let err = sign_request(&Ed25519Signer, &subject, &subject, &leave).unwrap_err();
        assert!(matches!(err, SigningError::InvalidKey(_)));
    }
}
