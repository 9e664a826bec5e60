use std::{fs, path::PathBuf};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::{Parser, ValueEnum};
use dpop_binding::services::dpop::{DPOP_PROOF_TYP, jwk_thumbprint};
use ed25519_dalek::Signer as _;
use ed25519_dalek::pkcs8::DecodePrivateKey as _;
use p256::pkcs8::DecodePrivateKey as _;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde_json::{Value, json};
use uuid::Uuid;

/// Mint a DPoP proof JWT for the token endpoint.
///
/// Prints the proof and the key fingerprint (jkt) the server will bind the
/// issued token to. Without `--private-pem` an ephemeral key is generated.
#[derive(Parser, Debug)]
#[command(name = "dpop-gen", version, about)]
struct Args {
    /// HTTP method (htm)
    #[arg(long, default_value = "POST")]
    method: String,

    /// Full token endpoint URL used as htu (e.g. http://localhost:4000/api/v1/token)
    #[arg(long)]
    url: String,

    /// Signature algorithm of the proof key
    #[arg(long, value_enum, default_value_t = Alg::Es256)]
    alg: Alg,

    /// Client private key in PKCS#8 PEM matching `--alg`
    #[arg(long, value_name = "FILE")]
    private_pem: Option<PathBuf>,

    /// Override iat (unix seconds). Default: now.
    #[arg(long)]
    iat: Option<i64>,

    /// Override jti. Default: random UUID v4.
    #[arg(long)]
    jti: Option<String>,

    /// Override the typ header (for negative tests)
    #[arg(long, default_value = DPOP_PROOF_TYP)]
    typ: String,

    /// Print only the proof
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Alg {
    Es256,
    Eddsa,
}

enum ClientKey {
    Es256(p256::ecdsa::SigningKey),
    EdDsa(ed25519_dalek::SigningKey),
}

impl ClientKey {
    fn load(alg: Alg, pem: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rng = rand::rngs::OsRng;
        Ok(match (alg, pem) {
            (Alg::Es256, Some(pem)) => Self::Es256(p256::ecdsa::SigningKey::from_pkcs8_pem(pem)?),
            (Alg::Es256, None) => Self::Es256(p256::ecdsa::SigningKey::random(&mut rng)),
            (Alg::Eddsa, Some(pem)) => Self::EdDsa(ed25519_dalek::SigningKey::from_pkcs8_pem(pem)?),
            (Alg::Eddsa, None) => Self::EdDsa(ed25519_dalek::SigningKey::generate(&mut rng)),
        })
    }

    fn alg(&self) -> &'static str {
        match self {
            Self::Es256(_) => "ES256",
            Self::EdDsa(_) => "EdDSA",
        }
    }

    fn public_jwk(&self) -> Value {
        match self {
            Self::Es256(key) => {
                let point = key.verifying_key().as_affine().to_encoded_point(false);
                let (Some(x), Some(y)) = (point.x(), point.y()) else {
                    unreachable!("uncompressed points carry both coordinates")
                };
                json!({
                    "kty": "EC",
                    "crv": "P-256",
                    "x": URL_SAFE_NO_PAD.encode(x),
                    "y": URL_SAFE_NO_PAD.encode(y),
                })
            }
            Self::EdDsa(key) => json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(key.verifying_key().as_bytes()),
            }),
        }
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Es256(key) => {
                use p256::ecdsa::signature::Signer as _;
                let signature: p256::ecdsa::Signature = key.sign(input);
                signature.to_bytes().to_vec()
            }
            Self::EdDsa(key) => key.sign(input).to_bytes().to_vec(),
        }
    }
}

fn b64url_json(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string().as_bytes())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let pem = args.private_pem.as_ref().map(fs::read_to_string).transpose()?;
    let key = ClientKey::load(args.alg, pem.as_deref())?;
    let jwk = key.public_jwk();

    let jkt = match &jwk {
        Value::Object(map) => jwk_thumbprint(map)?,
        _ => unreachable!("public_jwk always returns an object"),
    };

    let iat = args.iat.unwrap_or_else(now_unix);
    let jti = args.jti.unwrap_or_else(|| Uuid::new_v4().to_string());

    let header = json!({
        "typ": args.typ,
        "alg": key.alg(),
        "jwk": jwk,
    });
    let claims = json!({
        "jti": jti,
        "htm": args.method.to_uppercase(),
        "htu": args.url,
        "iat": iat,
    });

    let signing_input = format!("{}.{}", b64url_json(&header), b64url_json(&claims));
    let signature = URL_SAFE_NO_PAD.encode(key.sign(signing_input.as_bytes()));
    let proof = format!("{}.{}", signing_input, signature);

    if args.quiet {
        println!("{}", proof);
        return Ok(());
    }

    println!("DPoP: {}", proof);
    println!("jkt: {}", jkt);
    println!("iat: {}", iat);
    println!("jti: {}", jti);

    Ok(())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
