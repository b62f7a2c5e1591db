use crate::error::DnssecError;

/// DNSSEC algorithm numbers (RFC 4034, 5155, 5702, 6605, 8080).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsSecAlgorithm {
    RsaMd5,
    DSA,
    RsaSha1,
    DsaNsec3Sha1,
    RsaSha1Nsec3Sha1,
    RsaSha256,
    RsaSha512,
    EccGost,
    EcdsaP256Sha256,
    EcdsaP384Sha384,
    Ed25519,
    Ed448,
}

impl DnsSecAlgorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RsaMd5),
            3 => Some(Self::DSA),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            16 => Some(Self::Ed448),
            _ => None,
        }
    }

    /// Distinguishes a number nobody assigned from an assigned algorithm
    /// this build cannot verify.
    pub fn classify(value: u8) -> Result<Self, DnssecError> {
        match Self::from_u8(value) {
            None => Err(DnssecError::AlgoUnknown),
            Some(alg) if alg.ring_algorithm().is_none() => Err(DnssecError::AlgoNotImpl),
            Some(alg) => Ok(alg),
        }
    }

    /// RRSIG signatures for the ECDSA algorithms come as fixed-width
    /// (r, s) pairs, not ASN.1, hence the FIXED variants.
    pub fn ring_algorithm(self) -> Option<&'static dyn ring::signature::VerificationAlgorithm> {
        match self {
            Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 => {
                Some(&ring::signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY)
            }
            Self::RsaSha256 => Some(&ring::signature::RSA_PKCS1_2048_8192_SHA256),
            Self::RsaSha512 => Some(&ring::signature::RSA_PKCS1_2048_8192_SHA512),
            Self::EcdsaP256Sha256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED),
            Self::EcdsaP384Sha384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED),
            Self::Ed25519 => Some(&ring::signature::ED25519),
            _ => None,
        }
    }

    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            Self::RsaMd5 | Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 | Self::RsaSha256 | Self::RsaSha512
        )
    }

    pub fn is_ecdsa(self) -> bool {
        matches!(self, Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384)
    }
}
