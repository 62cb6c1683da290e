//! Unit tests for the Outbound Caller Service

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use voxpool_core::{FlowSid, VoxpoolError, VoxpoolService};

    use crate::active_flow::ActiveFlow;
    use crate::fakes::{FakeEnvironments, FakeLookup, FakeStudio};
    use crate::number_pool::{CountryNumberPool, NumberPool, RegionalNumberPool, SelectionSource};

    fn pool() -> Arc<NumberPool> {
        Arc::new(NumberPool::new(
            CountryNumberPool::new(vec![("US".to_string(), "+15550000".to_string())]),
            RegionalNumberPool::new(vec![("+4".to_string(), "+15559999".to_string())], "+15551111").unwrap(),
        ))
    }

    mod initiator_tests {
        use super::*;
        use crate::initiator::{
            render_code, resolve_message, CallCode, CallInitiator, CallRequest, DEFAULT_WELCOME_MESSAGE,
            NO_CODE_PLACEHOLDER,
        };

        fn lookup() -> Arc<FakeLookup> {
            Arc::new(
                FakeLookup::default()
                    .with_number("+15551234567", "+15551234567", Some("US"))
                    .with_number("+44 20 7946 0958", "+442079460958", Some("GB"))
                    .with_number("+33123456", "+33123456", Some("FR")),
            )
        }

        fn request(to: &str, message: Option<&str>, code: Option<CallCode>) -> CallRequest {
            CallRequest {
                to: Some(to.to_string()),
                message: message.map(str::to_string),
                code,
            }
        }

        #[test]
        fn test_code_rendering() {
            assert_eq!(render_code(Some(&CallCode::Text("5135".to_string()))), "5. 1. 3. 5");
            assert_eq!(render_code(Some(&CallCode::Number(513567))), "5. 1. 3. 5. 6. 7");
            assert_eq!(render_code(Some(&CallCode::Text(" 7 ".to_string()))), "7");
            assert_eq!(render_code(Some(&CallCode::Text(String::new()))), NO_CODE_PLACEHOLDER);
            assert_eq!(render_code(None), NO_CODE_PLACEHOLDER);
        }

        #[test]
        fn test_message_default() {
            assert_eq!(resolve_message(None), DEFAULT_WELCOME_MESSAGE);
            assert_eq!(resolve_message(Some("   ")), DEFAULT_WELCOME_MESSAGE);
            assert_eq!(resolve_message(Some("Your bank calling")), "Your bank calling");
        }

        #[test]
        fn test_code_accepts_string_or_number() {
            let from_text: CallRequest = serde_json::from_str(r#"{"to": "+1", "code": "0042"}"#).unwrap();
            assert_eq!(from_text.code, Some(CallCode::Text("0042".to_string())));

            let from_number: CallRequest = serde_json::from_str(r#"{"to": "+1", "code": 42}"#).unwrap();
            assert_eq!(from_number.code, Some(CallCode::Number(42)));

            let null_code: CallRequest = serde_json::from_str(r#"{"to": "+1", "code": null}"#).unwrap();
            assert_eq!(null_code.code, None);

            let missing: CallRequest = serde_json::from_str(r#"{"to": "+1"}"#).unwrap();
            assert_eq!(missing.code, None);
        }

        #[tokio::test]
        async fn test_initiate_uses_country_number() {
            let studio = Arc::new(FakeStudio::default());
            let flow = Arc::new(ActiveFlow::new(Some("FW123".to_string())));
            let initiator = CallInitiator::new(lookup(), studio.clone(), pool(), flow);

            let outcome = initiator
                .initiate(request("+15551234567", Some("Hello"), Some(CallCode::Text("5135".to_string()))))
                .await
                .unwrap();

            assert_eq!(outcome.from, "+15550000");
            assert_eq!(outcome.selected_by, SelectionSource::Country);
            assert_eq!(outcome.flow_sid, FlowSid::new("FW123"));
            assert_eq!(outcome.confirmation, format!("Initiated Studio Flow: {}", outcome.execution_sid));

            let executions = studio.executions.lock();
            assert_eq!(executions.len(), 1);
            let (flow_sid, execution) = &executions[0];
            assert_eq!(flow_sid, "FW123");
            assert_eq!(execution.to, "+15551234567");
            assert_eq!(execution.from, "+15550000");
            assert_eq!(execution.parameters["message"], "Hello");
            assert_eq!(execution.parameters["code"], "5. 1. 3. 5");
        }

        #[tokio::test]
        async fn test_initiate_calls_normalized_number_with_regional_from() {
            let studio = Arc::new(FakeStudio::default());
            let flow = Arc::new(ActiveFlow::new(Some("FW123".to_string())));
            let initiator = CallInitiator::new(lookup(), studio.clone(), pool(), flow);

            let outcome = initiator.initiate(request("+44 20 7946 0958", None, None)).await.unwrap();

            assert_eq!(outcome.to, "+442079460958");
            assert_eq!(outcome.from, "+15559999");
            assert_eq!(outcome.selected_by, SelectionSource::Regional);

            let executions = studio.executions.lock();
            assert_eq!(executions[0].1.parameters["message"], DEFAULT_WELCOME_MESSAGE);
            assert_eq!(executions[0].1.parameters["code"], NO_CODE_PLACEHOLDER);
        }

        #[tokio::test]
        async fn test_lookup_failure_aborts_before_execution() {
            let studio = Arc::new(FakeStudio::default());
            let flow = Arc::new(ActiveFlow::new(Some("FW123".to_string())));
            let initiator = CallInitiator::new(lookup(), studio.clone(), pool(), flow);

            let err = initiator.initiate(request("not-a-number", None, None)).await.unwrap_err();

            assert!(matches!(&err, VoxpoolError::Validation(msg) if msg.starts_with("Error trying to access LookUp API")));
            assert!(studio.executions.lock().is_empty());
        }

        #[tokio::test]
        async fn test_missing_to_skips_lookup() {
            let lookup = lookup();
            let studio = Arc::new(FakeStudio::default());
            let flow = Arc::new(ActiveFlow::new(Some("FW123".to_string())));
            let initiator = CallInitiator::new(lookup.clone(), studio, pool(), flow);

            let err = initiator.initiate(CallRequest::default()).await.unwrap_err();
            assert!(matches!(err, VoxpoolError::Validation(_)));

            let err = initiator.initiate(request("   ", None, None)).await.unwrap_err();
            assert!(matches!(err, VoxpoolError::Validation(_)));

            assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        }

        #[tokio::test]
        async fn test_missing_flow_sid_is_config_error() {
            let studio = Arc::new(FakeStudio::default());
            let initiator = CallInitiator::new(lookup(), studio.clone(), pool(), Arc::new(ActiveFlow::default()));

            let err = initiator.initiate(request("+33123456", None, None)).await.unwrap_err();
            assert!(matches!(err, VoxpoolError::Config(msg) if msg.contains("STUDIO_FLOW")));
            assert!(studio.executions.lock().is_empty());
        }

        #[tokio::test]
        async fn test_execution_failure_is_execution_error() {
            let studio = Arc::new(FakeStudio {
                fail_executions: true,
                ..Default::default()
            });
            let flow = Arc::new(ActiveFlow::new(Some("FW123".to_string())));
            let initiator = CallInitiator::new(lookup(), studio, pool(), flow);

            let err = initiator.initiate(request("+33123456", None, None)).await.unwrap_err();
            assert!(matches!(&err, VoxpoolError::Execution(msg) if msg.contains("not a valid phone number")));
            assert_eq!(err.status_code(), 502);
        }
    }

    mod redeployer_tests {
        use super::*;
        use crate::redeployer::{load_flow_definition, FlowRedeployer, RedeploySettings};
        use std::path::PathBuf;

        const DOMAIN: &str = "verify-calls-1234-dev.twil.io";

        fn bundled_asset() -> PathBuf {
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/studio.json"))
        }

        fn settings(asset_path: PathBuf) -> RedeploySettings {
            RedeploySettings {
                asset_path,
                friendly_name: "Outbound Verification Call".to_string(),
                flow_variable_key: "STUDIO_FLOW".to_string(),
                domain_name: Some(DOMAIN.to_string()),
                service_sid: None,
            }
        }

        #[tokio::test]
        async fn test_bundled_definition_parses() {
            let definition = load_flow_definition(&bundled_asset()).await.unwrap();
            assert_eq!(definition["initial_state"], "Trigger");
            assert!(definition["states"].as_array().is_some_and(|states| !states.is_empty()));
        }

        #[tokio::test]
        async fn test_missing_asset_is_config_error() {
            let err = load_flow_definition(&PathBuf::from("/nonexistent/studio.json")).await.unwrap_err();
            assert!(matches!(err, VoxpoolError::Config(_)));
        }

        #[tokio::test]
        async fn test_redeploy_updates_existing_variable() {
            let studio = Arc::new(FakeStudio::default());
            let environments = Arc::new(FakeEnvironments::new(DOMAIN).with_variable("STUDIO_FLOW", "FWold"));
            let active_flow = Arc::new(ActiveFlow::new(Some("FWold".to_string())));
            let redeployer = FlowRedeployer::new(
                studio.clone(),
                environments.clone(),
                settings(bundled_asset()),
                active_flow.clone(),
            );

            let state = redeployer.redeploy().await.unwrap();

            assert_eq!(state.environment_sid, environments.environment.sid);
            assert_eq!(state.build_sid, environments.environment.build_sid);
            assert_eq!(state.previous_flow_sid.as_deref(), Some("FWold"));
            assert_eq!(state.variable_sid, "ZV-STUDIO_FLOW");
            assert_eq!(state.confirmation, format!("Setup successfully ran! ==> {}", state.flow_sid));

            assert_eq!(environments.value_of("STUDIO_FLOW").as_deref(), Some(state.flow_sid.as_str()));
            assert_eq!(environments.variable_writes.load(Ordering::SeqCst), 1);
            assert_eq!(active_flow.current(), Some(state.flow_sid.clone()));

            let flows = studio.flows.lock();
            assert_eq!(flows[0].friendly_name, "Outbound Verification Call");
            assert_eq!(flows[0].definition, state.definition);
            assert!(flows[0].commit_message.as_deref().is_some_and(|m| m.contains("ZB")));
        }

        #[tokio::test]
        async fn test_redeploy_creates_missing_variable() {
            let studio = Arc::new(FakeStudio::default());
            let environments = Arc::new(FakeEnvironments::new(DOMAIN));
            let redeployer = FlowRedeployer::new(
                studio,
                environments.clone(),
                settings(bundled_asset()),
                Arc::new(ActiveFlow::default()),
            );

            let state = redeployer.redeploy().await.unwrap();
            assert!(state.previous_flow_sid.is_none());
            assert_eq!(environments.value_of("STUDIO_FLOW").as_deref(), Some(state.flow_sid.as_str()));
        }

        #[tokio::test]
        async fn test_publish_failure_leaves_variable_untouched() {
            let studio = Arc::new(FakeStudio {
                reject_flows: Some(serde_json::json!({ "errors": ["Transition to unknown state"] })),
                ..Default::default()
            });
            let environments = Arc::new(FakeEnvironments::new(DOMAIN).with_variable("STUDIO_FLOW", "FWold"));
            let active_flow = Arc::new(ActiveFlow::new(Some("FWold".to_string())));
            let redeployer = FlowRedeployer::new(
                studio,
                environments.clone(),
                settings(bundled_asset()),
                active_flow.clone(),
            );

            let err = redeployer.redeploy().await.unwrap_err();

            assert!(matches!(&err, VoxpoolError::Execution(msg) if msg.contains("Transition to unknown state")));
            assert_eq!(environments.value_of("STUDIO_FLOW").as_deref(), Some("FWold"));
            assert_eq!(environments.variable_writes.load(Ordering::SeqCst), 0);
            assert_eq!(active_flow.current(), Some(FlowSid::new("FWold")));
        }

        #[tokio::test]
        async fn test_unknown_domain_is_not_found() {
            let studio = Arc::new(FakeStudio::default());
            let redeployer = FlowRedeployer::new(
                studio.clone(),
                Arc::new(FakeEnvironments::new("someone-else.twil.io")),
                settings(bundled_asset()),
                Arc::new(ActiveFlow::default()),
            );

            let err = redeployer.redeploy().await.unwrap_err();
            assert!(matches!(err, VoxpoolError::NotFound(_)));
            assert!(studio.flows.lock().is_empty());
        }

        #[tokio::test]
        async fn test_missing_domain_is_config_error() {
            let mut settings = settings(bundled_asset());
            settings.domain_name = None;
            let redeployer = FlowRedeployer::new(
                Arc::new(FakeStudio::default()),
                Arc::new(FakeEnvironments::new(DOMAIN)),
                settings,
                Arc::new(ActiveFlow::default()),
            );

            let err = redeployer.redeploy().await.unwrap_err();
            assert!(matches!(err, VoxpoolError::Config(msg) if msg.contains("DOMAIN_NAME")));
        }
    }

    mod service_tests {
        use super::*;
        use crate::{OutboundCallerConfig, OutboundCallerService};

        fn config(pairs: &[(&str, &str)]) -> OutboundCallerConfig {
            let env: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            OutboundCallerConfig::from_source(&env).unwrap()
        }

        #[tokio::test]
        async fn test_ready_requires_credentials() {
            let service = OutboundCallerService::new(config(&[("DEFAULT_FROM_NUMBER", "+15551111")])).unwrap();
            let readiness = service.ready().await;
            assert!(!readiness.ready);
            assert_eq!(readiness.dependencies[0].name, "twilio");

            let service = OutboundCallerService::new(config(&[
                ("DEFAULT_FROM_NUMBER", "+15551111"),
                ("TWILIO_ACCOUNT_SID", "ACxxxx"),
                ("TWILIO_AUTH_TOKEN", "token"),
            ]))
            .unwrap();
            assert!(service.ready().await.ready);
        }

        #[tokio::test]
        async fn test_health_reports_service_id() {
            let service = OutboundCallerService::new(config(&[("DEFAULT_FROM_NUMBER", "+15551111")])).unwrap();
            let health = service.health().await;
            assert!(health.healthy);
            assert_eq!(health.service_id, "outbound-caller");
        }
    }
}
