use shared_secret_encrypt::codec::{self, ShareLink};
use shared_secret_encrypt::{Config, SecretSharing};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    println!("=== Shared Secret Demo ===\n");

    let sharing = SecretSharing::builder(5, 3)
        .with_config(Config::new().with_key_fingerprint(true))
        .build()?;
    let secret = b"launch codes: 0000";

    let sealed = sharing.seal(secret)?;
    let fingerprint = sealed
        .fingerprint
        .ok_or_else(|| anyhow::anyhow!("seal returned no fingerprint"))?;
    let fingerprint_text = codec::encode_fingerprint(&fingerprint);
    println!("Envelope: {}", codec::encode(&sealed.envelope));
    println!("Key fingerprint: {fingerprint_text}");
    for share in &sealed.shares {
        println!("Share {}: {}", share.index, codec::encode_share(share));
    }
    println!();

    // Hand the last share over as a password-protected link
    let bundle = sharing.protect_share(&sealed.shares[4], "correct-horse")?;
    let url = ShareLink::from_protected(&bundle).to_url("https://example.org");
    println!("Link for share 5: {url}\n");

    let received = ShareLink::from_url(&url)?.to_protected()?;
    let linked = sharing.unprotect_share(&received, "correct-horse")?;

    // The fingerprint comes back from storage as text
    let stored = codec::decode_fingerprint(&fingerprint_text)?;

    let quorum = [sealed.shares[0].clone(), sealed.shares[2].clone(), linked];
    let opened = sharing.open(&sealed.envelope, &quorum, Some(&stored))?;
    println!("Recovered with shares 1, 3 and 5: {}", String::from_utf8(opened)?);

    let too_few = &sealed.shares[..2];
    match sharing.open(&sealed.envelope, too_few, Some(&stored)) {
        Ok(_) => println!("Two shares opened the envelope?!"),
        Err(e) => println!("Two shares: {e}"),
    }

    Ok(())
}
