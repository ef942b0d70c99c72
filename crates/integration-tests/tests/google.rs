mod harness;

use harness::config::ConfigBuilder;
use harness::project;
use quill_llm::{CompletionParams, FinishReason, Message, ProviderRegistry, RequestContext};
use quill_tools::ToolRegistry;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn function_call_signature_survives_the_tool_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .and(header("x-goog-api-key", "AIza-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "get_chapter_structure", "args": {"id": "ch1"}}, "thoughtSignature": "sig-1"}
                ]},
                "finishReason": "STOP"
            }],
            "modelVersion": "gemini-2.5-pro"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{}, {}, {"role": "user", "parts": [{"functionResponse": {"name": "get_chapter_structure"}}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Two scenes, split at the ferry."}]},
                "finishReason": "STOP"
            }]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let config = ConfigBuilder::new()
        .with_provider("google", &format!("{}/v1beta", server.uri()), "AIza-test")
        .build();
    let providers = ProviderRegistry::from_config(&config.llm).unwrap();
    let (provider, model) = providers.resolve("google").unwrap();
    assert!(providers.resolve("google-vertex").is_err(), "vertex needs a project");

    let tools = ToolRegistry::with_builtin_tools().unwrap();
    let (tool_context, _) = project::tool_context();
    let request = RequestContext::new("AIza-test");

    let mut messages = vec![
        Message::system("You are a structural editor."),
        Message::user("How is chapter one built?"),
    ];
    let params = CompletionParams::new(model, messages.clone()).with_tools(tools.definitions_for_model());
    let first = provider.complete(&params, &request).await.unwrap();
    assert_eq!(first.finish_reason, FinishReason::ToolUse);
    let calls = first.tool_calls().to_vec();
    assert_eq!(calls[0].name, "get_chapter_structure");
    assert_eq!(calls[0].signature.as_deref(), Some("sig-1"));

    let result = tools.execute(&calls[0].name, calls[0].input.clone(), &tool_context).await;
    assert_eq!(result.data.as_ref().unwrap()["scenes"].as_array().unwrap().len(), 2);
    messages.push(Message::assistant_tool_calls("", calls.clone()));
    messages.push(Message::tool_result(calls[0].id.clone(), result.to_model_text()));

    let params = CompletionParams::new(model, messages).with_tools(tools.definitions_for_model());
    let second = provider.complete(&params, &request).await.unwrap();
    assert_eq!(second.content, "Two scenes, split at the ferry.");

    let requests = server.received_requests().await.unwrap();
    let opening: Value = requests[0].body_json().unwrap();
    assert_eq!(
        opening["systemInstruction"]["parts"][0]["text"],
        "You are a structural editor."
    );
    assert_eq!(
        opening["tools"][0]["functionDeclarations"].as_array().unwrap().len(),
        27
    );

    let follow_up: Value = requests[1].body_json().unwrap();
    let call_part = &follow_up["contents"][1]["parts"][0];
    assert_eq!(call_part["thoughtSignature"], "sig-1");
    assert_eq!(call_part["functionCall"]["args"], json!({"id": "ch1"}));
    let response = &follow_up["contents"][2]["parts"][0]["functionResponse"]["response"];
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["scenes"][1]["start_paragraph"], 4);
}
