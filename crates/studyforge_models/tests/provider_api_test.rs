use std::time::Duration;
use studyforge_core::{NewProviderConfig, ProviderConfig, ProviderId, ProviderKind};
use studyforge_error::{ProviderErrorKind, StudyforgeErrorKind};
use studyforge_interface::{DriverFactory, GenerateRequest};
use studyforge_models::HttpDriverFactory;

fn config(kind: ProviderKind, model: &str, key: String, base_url: Option<&str>) -> ProviderConfig {
    let mut builder = NewProviderConfig::builder();
    builder.provider_kind(kind).model(model).secret_credential(key);
    if let Some(url) = base_url {
        builder.base_url(url);
    }
    ProviderConfig::from_new(
        ProviderId::new(1),
        builder.build().unwrap(),
        chrono::Utc::now(),
    )
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let factory = HttpDriverFactory::new(Duration::from_secs(2)).unwrap();
    let driver = factory
        .build(&config(
            ProviderKind::Custom,
            "local",
            "k".to_string(),
            Some("http://127.0.0.1:9/v1"),
        ))
        .unwrap();

    let err = driver
        .generate(&GenerateRequest::new("ping"))
        .await
        .unwrap_err();

    match err.kind() {
        StudyforgeErrorKind::Provider(e) => assert!(
            matches!(
                e.kind,
                ProviderErrorKind::Network(_) | ProviderErrorKind::Timeout(_)
            ),
            "unexpected kind {:?}",
            e.kind
        ),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_groq_basic_generation() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let factory = HttpDriverFactory::new(Duration::from_secs(30))?;
    let driver = factory.build(&config(
        ProviderKind::Groq,
        "llama-3.1-8b-instant",
        std::env::var("GROQ_API_KEY")?,
        None,
    ))?;

    let response = driver
        .generate(&GenerateRequest::new("Hello").with_max_tokens(10))
        .await?;

    assert!(!response.text.is_empty(), "Should receive non-empty response");
    println!("Response: {:?}", response.text);

    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_anthropic_basic_generation() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let factory = HttpDriverFactory::new(Duration::from_secs(30))?;
    let driver = factory.build(&config(
        ProviderKind::Anthropic,
        "claude-3-5-haiku-latest",
        std::env::var("ANTHROPIC_API_KEY")?,
        None,
    ))?;

    let response = driver
        .generate(&GenerateRequest::new("Say hi").with_max_tokens(10))
        .await?;

    assert!(!response.text.is_empty());
    Ok(())
}
