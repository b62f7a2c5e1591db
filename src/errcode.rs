//! The closed set of integer codes every observable failure maps into.
//!
//! Codes surface as item values to the monitoring platform, so the exact
//! numbers are part of the external contract. They are partitioned into
//! bands: internal errors (-1..-199), DNS UDP (-200..-499), DNS TCP
//! (-600..-899), and dedicated RDDS43/RDDS80/RDAP ladders.

use crate::error::{
    DnsKeysError, DnssecError, HttpError, HttpPreStatusError, NsAnswerError, NsQueryError,
    ResolverError, RrClassError,
};

/// No value was obtained during the check.
pub const RSM_NO_VALUE: i32 = -1000;

/// End of the internal error band: -1..=-199 never count as service errors.
pub const INTERNAL_LAST: i32 = -199;

pub const DNS_UDP_INTERNAL_GENERAL: i32 = -1;
pub const DNS_UDP_INTERNAL_RES_CATCHALL: i32 = -2;

pub const DNS_TCP_INTERNAL_GENERAL: i32 = DNS_UDP_INTERNAL_GENERAL;
pub const DNS_TCP_INTERNAL_RES_CATCHALL: i32 = -3;

pub const RDDS43_INTERNAL_GENERAL: i32 = -1;
pub const RDDS43_INTERNAL_IP_UNSUP: i32 = -2;
pub const RDDS43_INTERNAL_RES_CATCHALL: i32 = -3;

pub const RDDS80_INTERNAL_GENERAL: i32 = RDDS43_INTERNAL_GENERAL;
pub const RDDS80_INTERNAL_IP_UNSUP: i32 = RDDS43_INTERNAL_IP_UNSUP;
pub const RDDS80_INTERNAL_RES_CATCHALL: i32 = -4;

pub const RDAP_INTERNAL_GENERAL: i32 = -1;
pub const RDAP_INTERNAL_IP_UNSUP: i32 = -2;
pub const RDAP_INTERNAL_RES_CATCHALL: i32 = -5;

/* DNS UDP error codes */
pub const DNS_UDP_NS_NOREPLY: i32 = -200;
pub const DNS_UDP_CLASS_CHAOS: i32 = -207;
pub const DNS_UDP_CLASS_HESIOD: i32 = -208;
pub const DNS_UDP_CLASS_CATCHALL: i32 = -209;
pub const DNS_UDP_HEADER: i32 = -210;
pub const DNS_UDP_QUESTION: i32 = -211;
pub const DNS_UDP_ANSWER: i32 = -212;
pub const DNS_UDP_AUTHORITY: i32 = -213;
pub const DNS_UDP_ADDITIONAL: i32 = -214;
pub const DNS_UDP_CATCHALL: i32 = -215;
pub const DNS_UDP_NOAAFLAG: i32 = -250;
pub const DNS_UDP_NODOMAIN: i32 = -251;
pub const DNS_UDP_RCODE_FORMERR: i32 = -253;
pub const DNS_UDP_RCODE_SERVFAIL: i32 = -254;
pub const DNS_UDP_RCODE_NOTIMP: i32 = -255;
pub const DNS_UDP_RCODE_REFUSED: i32 = -256;
pub const DNS_UDP_RCODE_YXDOMAIN: i32 = -257;
pub const DNS_UDP_RCODE_YXRRSET: i32 = -258;
pub const DNS_UDP_RCODE_NXRRSET: i32 = -259;
pub const DNS_UDP_RCODE_NOTAUTH: i32 = -260;
pub const DNS_UDP_RCODE_NOTZONE: i32 = -261;
pub const DNS_UDP_RCODE_BADVERS_OR: i32 = -262;
pub const DNS_UDP_RCODE_BADKEY: i32 = -263;
pub const DNS_UDP_RCODE_BADTIME: i32 = -264;
pub const DNS_UDP_RCODE_BADMODE: i32 = -265;
pub const DNS_UDP_RCODE_BADNAME: i32 = -266;
pub const DNS_UDP_RCODE_BADALG: i32 = -267;
pub const DNS_UDP_RCODE_BADTRUNC: i32 = -268;
pub const DNS_UDP_RCODE_BADCOOKIE: i32 = -269;
pub const DNS_UDP_RCODE_CATCHALL: i32 = -270;
pub const DNS_UDP_RES_NOREPLY: i32 = -400;
/* DNS UDP DNSSEC error codes; FIRST/LAST delimit the set-membership band */
pub const DNS_UDP_DNSSEC_FIRST: i32 = -401;
pub const DNS_UDP_DNSKEY_NONE: i32 = -401;
pub const DNS_UDP_DNSKEY_NOADBIT: i32 = -402;
pub const DNS_UDP_RES_NXDOMAIN: i32 = -403;
pub const DNS_UDP_ALGO_UNKNOWN: i32 = -405;
pub const DNS_UDP_ALGO_NOT_IMPL: i32 = -406;
pub const DNS_UDP_RRSIG_NONE: i32 = -407;
pub const DNS_UDP_NO_NSEC_IN_AUTH: i32 = -408;
pub const DNS_UDP_RRSIG_NOTCOVERED: i32 = -410;
pub const DNS_UDP_RRSIG_NOT_SIGNED: i32 = -414;
pub const DNS_UDP_SIG_BOGUS: i32 = -415;
pub const DNS_UDP_SIG_EXPIRED: i32 = -416;
pub const DNS_UDP_SIG_NOT_INCEPTED: i32 = -417;
pub const DNS_UDP_SIG_EX_BEFORE_IN: i32 = -418;
pub const DNS_UDP_NSEC3_ERROR: i32 = -419;
pub const DNS_UDP_RR_NOTCOVERED: i32 = -422;
pub const DNS_UDP_WILD_NOTCOVERED: i32 = -423;
pub const DNS_UDP_RRSIG_MISS_RDATA: i32 = -425;
pub const DNS_UDP_DNSSEC_CATCHALL: i32 = -427;
pub const DNS_UDP_DNSSEC_LAST: i32 = -427;

/* DNS TCP error codes */
pub const DNS_TCP_NS_TO: i32 = -600;
pub const DNS_TCP_NS_ECON: i32 = -601;
pub const DNS_TCP_CLASS_CHAOS: i32 = -607;
pub const DNS_TCP_CLASS_HESIOD: i32 = -608;
pub const DNS_TCP_CLASS_CATCHALL: i32 = -609;
pub const DNS_TCP_HEADER: i32 = -610;
pub const DNS_TCP_QUESTION: i32 = -611;
pub const DNS_TCP_ANSWER: i32 = -612;
pub const DNS_TCP_AUTHORITY: i32 = -613;
pub const DNS_TCP_ADDITIONAL: i32 = -614;
pub const DNS_TCP_CATCHALL: i32 = -615;
pub const DNS_TCP_NOAAFLAG: i32 = -650;
pub const DNS_TCP_NODOMAIN: i32 = -651;
pub const DNS_TCP_RCODE_FORMERR: i32 = -653;
pub const DNS_TCP_RCODE_SERVFAIL: i32 = -654;
pub const DNS_TCP_RCODE_NOTIMP: i32 = -655;
pub const DNS_TCP_RCODE_REFUSED: i32 = -656;
pub const DNS_TCP_RCODE_YXDOMAIN: i32 = -657;
pub const DNS_TCP_RCODE_YXRRSET: i32 = -658;
pub const DNS_TCP_RCODE_NXRRSET: i32 = -659;
pub const DNS_TCP_RCODE_NOTAUTH: i32 = -660;
pub const DNS_TCP_RCODE_NOTZONE: i32 = -661;
pub const DNS_TCP_RCODE_BADVERS_OR: i32 = -662;
pub const DNS_TCP_RCODE_BADKEY: i32 = -663;
pub const DNS_TCP_RCODE_BADTIME: i32 = -664;
pub const DNS_TCP_RCODE_BADMODE: i32 = -665;
pub const DNS_TCP_RCODE_BADNAME: i32 = -666;
pub const DNS_TCP_RCODE_BADALG: i32 = -667;
pub const DNS_TCP_RCODE_BADTRUNC: i32 = -668;
pub const DNS_TCP_RCODE_BADCOOKIE: i32 = -669;
pub const DNS_TCP_RCODE_CATCHALL: i32 = -670;
pub const DNS_TCP_RES_NOREPLY: i32 = -800;
/* DNS TCP DNSSEC error codes */
pub const DNS_TCP_DNSSEC_FIRST: i32 = -801;
pub const DNS_TCP_DNSKEY_NONE: i32 = -801;
pub const DNS_TCP_DNSKEY_NOADBIT: i32 = -802;
pub const DNS_TCP_RES_NXDOMAIN: i32 = -803;
pub const DNS_TCP_ALGO_UNKNOWN: i32 = -805;
pub const DNS_TCP_ALGO_NOT_IMPL: i32 = -806;
pub const DNS_TCP_RRSIG_NONE: i32 = -807;
pub const DNS_TCP_NO_NSEC_IN_AUTH: i32 = -808;
pub const DNS_TCP_RRSIG_NOTCOVERED: i32 = -810;
pub const DNS_TCP_RRSIG_NOT_SIGNED: i32 = -814;
pub const DNS_TCP_SIG_BOGUS: i32 = -815;
pub const DNS_TCP_SIG_EXPIRED: i32 = -816;
pub const DNS_TCP_SIG_NOT_INCEPTED: i32 = -817;
pub const DNS_TCP_SIG_EX_BEFORE_IN: i32 = -818;
pub const DNS_TCP_NSEC3_ERROR: i32 = -819;
pub const DNS_TCP_RR_NOTCOVERED: i32 = -822;
pub const DNS_TCP_WILD_NOTCOVERED: i32 = -823;
pub const DNS_TCP_RRSIG_MISS_RDATA: i32 = -825;
pub const DNS_TCP_DNSSEC_CATCHALL: i32 = -827;
pub const DNS_TCP_DNSSEC_LAST: i32 = -827;

/* RDDS error codes */
pub const RDDS43_NONS: i32 = -201;
pub const RDDS80_NOCODE: i32 = -206;
pub const RDDS43_RES_NOREPLY: i32 = -222;
pub const RDDS43_RES_SERVFAIL: i32 = -224;
pub const RDDS43_RES_NXDOMAIN: i32 = -225;
pub const RDDS43_TO: i32 = -227;
pub const RDDS43_ECON: i32 = -228;
pub const RDDS43_EMPTY: i32 = -229;
pub const RDDS80_RES_NOREPLY: i32 = -250;
pub const RDDS80_RES_SERVFAIL: i32 = -252;
pub const RDDS80_RES_NXDOMAIN: i32 = -253;
pub const RDDS80_TO: i32 = -255;
pub const RDDS80_ECON: i32 = -256;
pub const RDDS80_EHTTP: i32 = -257;
pub const RDDS80_EHTTPS: i32 = -258;
pub const RDDS80_EMAXREDIRECTS: i32 = -259;
pub const RDDS80_HTTP_BASE: i32 = -300;

/* RDAP error codes */
pub const RDAP_NOTLISTED: i32 = -390;
pub const RDAP_NOHTTPS: i32 = -391;
pub const RDAP_RES_NOREPLY: i32 = -400;
pub const RDAP_RES_SERVFAIL: i32 = -402;
pub const RDAP_RES_NXDOMAIN: i32 = -403;
pub const RDAP_TO: i32 = -405;
pub const RDAP_ECON: i32 = -406;
pub const RDAP_EJSON: i32 = -407;
pub const RDAP_NONAME: i32 = -408;
pub const RDAP_ENAME: i32 = -409;
pub const RDAP_EHTTP: i32 = -413;
pub const RDAP_EHTTPS: i32 = -414;
pub const RDAP_EMAXREDIRECTS: i32 = -415;
pub const RDAP_HTTP_BASE: i32 = -500;
/* this one is missing from the service specification */
pub const RDAP_NOCODE: i32 = RDAP_INTERNAL_GENERAL;

pub const PROBE_OFFLINE: i32 = 0;
pub const PROBE_ONLINE: i32 = 1;
pub const PROBE_UNSUPPORTED: i32 = 2;

/// The two flavours of the authoritative DNS test. Every internal error
/// kind has a dedicated code per interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsInterface {
    Udp,
    Tcp,
}

impl DnsInterface {
    pub fn ns_query_error(self, err: NsQueryError) -> i32 {
        match self {
            Self::Udp => match err {
                NsQueryError::Internal => DNS_UDP_INTERNAL_GENERAL,
                NsQueryError::NoReply => DNS_UDP_NS_NOREPLY,
                NsQueryError::Econ => DNS_UDP_INTERNAL_GENERAL,
                NsQueryError::To => DNS_UDP_INTERNAL_GENERAL,
                NsQueryError::IncHeader => DNS_UDP_HEADER,
                NsQueryError::IncQuestion => DNS_UDP_QUESTION,
                NsQueryError::IncAnswer => DNS_UDP_ANSWER,
                NsQueryError::IncAuthority => DNS_UDP_AUTHORITY,
                NsQueryError::IncAdditional => DNS_UDP_ADDITIONAL,
                NsQueryError::Catchall => DNS_UDP_CATCHALL,
            },
            Self::Tcp => match err {
                NsQueryError::Internal => DNS_TCP_INTERNAL_GENERAL,
                NsQueryError::NoReply => DNS_TCP_INTERNAL_GENERAL,
                NsQueryError::Econ => DNS_TCP_NS_ECON,
                NsQueryError::To => DNS_TCP_NS_TO,
                NsQueryError::IncHeader => DNS_TCP_HEADER,
                NsQueryError::IncQuestion => DNS_TCP_QUESTION,
                NsQueryError::IncAnswer => DNS_TCP_ANSWER,
                NsQueryError::IncAuthority => DNS_TCP_AUTHORITY,
                NsQueryError::IncAdditional => DNS_TCP_ADDITIONAL,
                NsQueryError::Catchall => DNS_TCP_CATCHALL,
            },
        }
    }

    pub fn ns_answer_error(self, err: NsAnswerError) -> i32 {
        match self {
            Self::Udp => match err {
                NsAnswerError::Internal => DNS_UDP_INTERNAL_GENERAL,
                NsAnswerError::NoAaFlag => DNS_UDP_NOAAFLAG,
                NsAnswerError::NoDomain => DNS_UDP_NODOMAIN,
            },
            Self::Tcp => match err {
                NsAnswerError::Internal => DNS_TCP_INTERNAL_GENERAL,
                NsAnswerError::NoAaFlag => DNS_TCP_NOAAFLAG,
                NsAnswerError::NoDomain => DNS_TCP_NODOMAIN,
            },
        }
    }

    pub fn dnskeys_error(self, err: DnsKeysError) -> i32 {
        match self {
            Self::Udp => match err {
                DnsKeysError::Internal => DNS_UDP_INTERNAL_GENERAL,
                DnsKeysError::NoReply => DNS_UDP_RES_NOREPLY,
                DnsKeysError::NoKeys => DNS_UDP_DNSKEY_NONE,
                DnsKeysError::NoAdBit => DNS_UDP_DNSKEY_NOADBIT,
                DnsKeysError::NxDomain => DNS_UDP_RES_NXDOMAIN,
                DnsKeysError::Catchall => DNS_UDP_INTERNAL_RES_CATCHALL,
            },
            Self::Tcp => match err {
                DnsKeysError::Internal => DNS_TCP_INTERNAL_GENERAL,
                DnsKeysError::NoReply => DNS_TCP_RES_NOREPLY,
                DnsKeysError::NoKeys => DNS_TCP_DNSKEY_NONE,
                DnsKeysError::NoAdBit => DNS_TCP_DNSKEY_NOADBIT,
                DnsKeysError::NxDomain => DNS_TCP_RES_NXDOMAIN,
                DnsKeysError::Catchall => DNS_TCP_INTERNAL_RES_CATCHALL,
            },
        }
    }

    pub fn dnssec_error(self, err: DnssecError) -> i32 {
        match self {
            Self::Udp => match err {
                DnssecError::Internal => DNS_UDP_INTERNAL_GENERAL,
                DnssecError::AlgoUnknown => DNS_UDP_ALGO_UNKNOWN,
                DnssecError::AlgoNotImpl => DNS_UDP_ALGO_NOT_IMPL,
                DnssecError::RrsigNone => DNS_UDP_RRSIG_NONE,
                DnssecError::NoNsecInAuth => DNS_UDP_NO_NSEC_IN_AUTH,
                DnssecError::RrsigNotCovered => DNS_UDP_RRSIG_NOTCOVERED,
                DnssecError::RrsigNotSigned => DNS_UDP_RRSIG_NOT_SIGNED,
                DnssecError::SigBogus => DNS_UDP_SIG_BOGUS,
                DnssecError::SigExpired => DNS_UDP_SIG_EXPIRED,
                DnssecError::SigNotIncepted => DNS_UDP_SIG_NOT_INCEPTED,
                DnssecError::SigExpirationBeforeInception => DNS_UDP_SIG_EX_BEFORE_IN,
                DnssecError::Nsec3Error => DNS_UDP_NSEC3_ERROR,
                DnssecError::RrNotCovered => DNS_UDP_RR_NOTCOVERED,
                DnssecError::WildNotCovered => DNS_UDP_WILD_NOTCOVERED,
                DnssecError::RrsigMissRdata => DNS_UDP_RRSIG_MISS_RDATA,
                DnssecError::Catchall => DNS_UDP_DNSSEC_CATCHALL,
            },
            Self::Tcp => match err {
                DnssecError::Internal => DNS_TCP_INTERNAL_GENERAL,
                DnssecError::AlgoUnknown => DNS_TCP_ALGO_UNKNOWN,
                DnssecError::AlgoNotImpl => DNS_TCP_ALGO_NOT_IMPL,
                DnssecError::RrsigNone => DNS_TCP_RRSIG_NONE,
                DnssecError::NoNsecInAuth => DNS_TCP_NO_NSEC_IN_AUTH,
                DnssecError::RrsigNotCovered => DNS_TCP_RRSIG_NOTCOVERED,
                DnssecError::RrsigNotSigned => DNS_TCP_RRSIG_NOT_SIGNED,
                DnssecError::SigBogus => DNS_TCP_SIG_BOGUS,
                DnssecError::SigExpired => DNS_TCP_SIG_EXPIRED,
                DnssecError::SigNotIncepted => DNS_TCP_SIG_NOT_INCEPTED,
                DnssecError::SigExpirationBeforeInception => DNS_TCP_SIG_EX_BEFORE_IN,
                DnssecError::Nsec3Error => DNS_TCP_NSEC3_ERROR,
                DnssecError::RrNotCovered => DNS_TCP_RR_NOTCOVERED,
                DnssecError::WildNotCovered => DNS_TCP_WILD_NOTCOVERED,
                DnssecError::RrsigMissRdata => DNS_TCP_RRSIG_MISS_RDATA,
                DnssecError::Catchall => DNS_TCP_DNSSEC_CATCHALL,
            },
        }
    }

    pub fn rr_class_error(self, err: RrClassError) -> i32 {
        match self {
            Self::Udp => match err {
                RrClassError::Internal => DNS_UDP_INTERNAL_GENERAL,
                RrClassError::Chaos => DNS_UDP_CLASS_CHAOS,
                RrClassError::Hesiod => DNS_UDP_CLASS_HESIOD,
                RrClassError::Catchall => DNS_UDP_CLASS_CATCHALL,
            },
            Self::Tcp => match err {
                RrClassError::Internal => DNS_TCP_INTERNAL_GENERAL,
                RrClassError::Chaos => DNS_TCP_CLASS_CHAOS,
                RrClassError::Hesiod => DNS_TCP_CLASS_HESIOD,
                RrClassError::Catchall => DNS_TCP_CLASS_CATCHALL,
            },
        }
    }

    /// Dedicated code for every assigned, non-private RCODE other than
    /// NOERROR and NXDOMAIN.
    pub fn rcode_not_nxdomain(self, rcode: u16) -> i32 {
        let udp = match rcode {
            1 => DNS_UDP_RCODE_FORMERR,
            2 => DNS_UDP_RCODE_SERVFAIL,
            4 => DNS_UDP_RCODE_NOTIMP,
            5 => DNS_UDP_RCODE_REFUSED,
            6 => DNS_UDP_RCODE_YXDOMAIN,
            7 => DNS_UDP_RCODE_YXRRSET,
            8 => DNS_UDP_RCODE_NXRRSET,
            9 => DNS_UDP_RCODE_NOTAUTH,
            10 => DNS_UDP_RCODE_NOTZONE,
            16 => DNS_UDP_RCODE_BADVERS_OR,
            17 => DNS_UDP_RCODE_BADKEY,
            18 => DNS_UDP_RCODE_BADTIME,
            19 => DNS_UDP_RCODE_BADMODE,
            20 => DNS_UDP_RCODE_BADNAME,
            21 => DNS_UDP_RCODE_BADALG,
            22 => DNS_UDP_RCODE_BADTRUNC,
            23 => DNS_UDP_RCODE_BADCOOKIE,
            _ => DNS_UDP_RCODE_CATCHALL,
        };

        match self {
            Self::Udp => udp,
            /* the TCP rcode ladder mirrors the UDP one, shifted by one band */
            Self::Tcp => udp - (DNS_UDP_RCODE_FORMERR - DNS_TCP_RCODE_FORMERR),
        }
    }

    /// The DNSSEC sub-band of this interface as (first, last); first is
    /// the numerically larger code.
    pub fn dnssec_band(self) -> (i32, i32) {
        match self {
            Self::Udp => (DNS_UDP_DNSSEC_FIRST, DNS_UDP_DNSSEC_LAST),
            Self::Tcp => (DNS_TCP_DNSSEC_FIRST, DNS_TCP_DNSSEC_LAST),
        }
    }
}

/// True if the code falls into either interface's DNSSEC sub-band.
pub fn is_dnssec_ec(rtt: i32) -> bool {
    (DNS_UDP_DNSSEC_FIRST >= rtt && rtt >= DNS_UDP_DNSSEC_LAST)
        || (DNS_TCP_DNSSEC_FIRST >= rtt && rtt >= DNS_TCP_DNSSEC_LAST)
}

/// The web-facing registration data interfaces share the HTTP error shape
/// but own disjoint code ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebInterface {
    Rdds80,
    Rdap,
}

impl WebInterface {
    fn pre_status_error(self, err: HttpPreStatusError) -> i32 {
        match self {
            Self::Rdds80 => match err {
                HttpPreStatusError::Internal => RDDS80_INTERNAL_GENERAL,
                HttpPreStatusError::Timeout => RDDS80_TO,
                HttpPreStatusError::Econ => RDDS80_ECON,
                HttpPreStatusError::EHttp => RDDS80_EHTTP,
                HttpPreStatusError::EHttps => RDDS80_EHTTPS,
                HttpPreStatusError::NoCode => RDDS80_NOCODE,
                HttpPreStatusError::EMaxRedirects => RDDS80_EMAXREDIRECTS,
            },
            Self::Rdap => match err {
                HttpPreStatusError::Internal => RDAP_INTERNAL_GENERAL,
                HttpPreStatusError::Timeout => RDAP_TO,
                HttpPreStatusError::Econ => RDAP_ECON,
                HttpPreStatusError::EHttp => RDAP_EHTTP,
                HttpPreStatusError::EHttps => RDAP_EHTTPS,
                HttpPreStatusError::NoCode => RDAP_NOCODE,
                HttpPreStatusError::EMaxRedirects => RDAP_EMAXREDIRECTS,
            },
        }
    }

    pub fn http_error(self, err: HttpError) -> i32 {
        match err {
            HttpError::PreStatus(pre) => self.pre_status_error(pre),
            HttpError::HttpStatus(code) => {
                let base = match self {
                    Self::Rdds80 => RDDS80_HTTP_BASE,
                    Self::Rdap => RDAP_HTTP_BASE,
                };
                base - map_http_code(code)
            }
        }
    }
}

pub fn resolver_error_to_rdds43(err: ResolverError) -> i32 {
    match err {
        ResolverError::Internal => RDDS43_INTERNAL_GENERAL,
        ResolverError::NoReply => RDDS43_RES_NOREPLY,
        ResolverError::ServFail => RDDS43_RES_SERVFAIL,
        ResolverError::NxDomain => RDDS43_RES_NXDOMAIN,
        ResolverError::Catchall => RDDS43_INTERNAL_RES_CATCHALL,
    }
}

pub fn resolver_error_to_rdds80(err: ResolverError) -> i32 {
    match err {
        ResolverError::Internal => RDDS80_INTERNAL_GENERAL,
        ResolverError::NoReply => RDDS80_RES_NOREPLY,
        ResolverError::ServFail => RDDS80_RES_SERVFAIL,
        ResolverError::NxDomain => RDDS80_RES_NXDOMAIN,
        ResolverError::Catchall => RDDS80_INTERNAL_RES_CATCHALL,
    }
}

pub fn resolver_error_to_rdap(err: ResolverError) -> i32 {
    match err {
        ResolverError::Internal => RDAP_INTERNAL_GENERAL,
        ResolverError::NoReply => RDAP_RES_NOREPLY,
        ResolverError::ServFail => RDAP_RES_SERVFAIL,
        ResolverError::NxDomain => RDAP_RES_NXDOMAIN,
        ResolverError::Catchall => RDAP_INTERNAL_RES_CATCHALL,
    }
}

/// Assigns a monotone ordinal to every assigned HTTP status code,
/// omitting 200 and the unassigned ranges, as per
/// <http://www.iana.org/assignments/http-status-codes/http-status-codes.xhtml>.
/// 301, 302 and 303 are absent because redirects are followed.
pub fn map_http_code(http_code: u16) -> i32 {
    match http_code {
        100 => 0,
        101 => 1,
        102 => 2,
        103 => 3,
        201 => 4,
        202 => 5,
        203 => 6,
        204 => 7,
        205 => 8,
        206 => 9,
        207 => 10,
        208 => 11,
        226 => 12,
        300 => 13,
        304 => 17,
        305 => 18,
        306 => 19,
        307 => 20,
        308 => 21,
        400 => 22,
        401 => 23,
        402 => 24,
        403 => 25,
        404 => 26,
        405 => 27,
        406 => 28,
        407 => 29,
        408 => 30,
        409 => 31,
        410 => 32,
        411 => 33,
        412 => 34,
        413 => 35,
        414 => 36,
        415 => 37,
        416 => 38,
        417 => 39,
        421 => 40,
        422 => 41,
        423 => 42,
        424 => 43,
        426 => 44,
        428 => 45,
        429 => 46,
        431 => 47,
        451 => 48,
        500 => 49,
        501 => 50,
        502 => 51,
        503 => 52,
        504 => 53,
        505 => 54,
        506 => 55,
        507 => 56,
        508 => 57,
        510 => 58,
        511 => 59,
        /* newly assigned codes without an association yet */
        _ => 60,
    }
}

/// True when the code does not represent a service error.
pub fn ec_noerror(ec: i32) -> bool {
    ec >= 0 || ec == RSM_NO_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_rcode_ladder_mirrors_udp() {
        assert_eq!(DnsInterface::Udp.rcode_not_nxdomain(1), -253);
        assert_eq!(DnsInterface::Tcp.rcode_not_nxdomain(1), -653);
        assert_eq!(DnsInterface::Udp.rcode_not_nxdomain(23), -269);
        assert_eq!(DnsInterface::Tcp.rcode_not_nxdomain(23), -669);
        assert_eq!(DnsInterface::Udp.rcode_not_nxdomain(11), -270);
        assert_eq!(DnsInterface::Tcp.rcode_not_nxdomain(11), -670);
    }

    #[test]
    fn protocol_inapplicable_kinds_alias_to_internal() {
        assert_eq!(
            DnsInterface::Tcp.ns_query_error(crate::error::NsQueryError::NoReply),
            DNS_TCP_INTERNAL_GENERAL
        );
        assert_eq!(
            DnsInterface::Udp.ns_query_error(crate::error::NsQueryError::Econ),
            DNS_UDP_INTERNAL_GENERAL
        );
        assert_eq!(
            DnsInterface::Udp.ns_query_error(crate::error::NsQueryError::To),
            DNS_UDP_INTERNAL_GENERAL
        );
    }

    #[test]
    fn dnssec_band_membership() {
        assert!(is_dnssec_ec(DNS_UDP_RRSIG_NONE));
        assert!(is_dnssec_ec(DNS_TCP_DNSSEC_CATCHALL));
        assert!(is_dnssec_ec(DNS_UDP_DNSSEC_FIRST));
        assert!(is_dnssec_ec(DNS_TCP_DNSSEC_LAST));
        assert!(!is_dnssec_ec(DNS_UDP_NS_NOREPLY));
        assert!(!is_dnssec_ec(DNS_UDP_RCODE_SERVFAIL));
        assert!(!is_dnssec_ec(-400));
        assert!(!is_dnssec_ec(-428));
    }

    #[test]
    fn http_status_maps_through_base() {
        assert_eq!(
            WebInterface::Rdds80.http_error(HttpError::HttpStatus(404)),
            -326
        );
        assert_eq!(
            WebInterface::Rdap.http_error(HttpError::HttpStatus(500)),
            -549
        );
        /* unassigned codes share the catch-all ordinal */
        assert_eq!(map_http_code(299), 60);
        assert_eq!(map_http_code(418), 60);
    }

    #[test]
    fn dnssec_errors_stay_in_band() {
        let kinds = [
            DnssecError::AlgoUnknown,
            DnssecError::AlgoNotImpl,
            DnssecError::RrsigNone,
            DnssecError::NoNsecInAuth,
            DnssecError::RrsigNotCovered,
            DnssecError::RrsigNotSigned,
            DnssecError::SigBogus,
            DnssecError::SigExpired,
            DnssecError::SigNotIncepted,
            DnssecError::SigExpirationBeforeInception,
            DnssecError::Nsec3Error,
            DnssecError::RrNotCovered,
            DnssecError::WildNotCovered,
            DnssecError::RrsigMissRdata,
            DnssecError::Catchall,
        ];

        for kind in kinds {
            for iface in [DnsInterface::Udp, DnsInterface::Tcp] {
                let (first, last) = iface.dnssec_band();
                let ec = iface.dnssec_error(kind);
                assert!(first >= ec && ec >= last, "{kind:?} mapped to {ec}");
            }
        }
    }
}
