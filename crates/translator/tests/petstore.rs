//! End-to-end tests: the pet-store document is translated into a schema and
//! queried against a mock upstream.

use async_graphql::dynamic::Schema;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn petstore_document(upstream_url: &str) -> openapiv3::OpenAPI {
    let mut document: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/petstore.json")).unwrap();
    document["servers"][0]["url"] = json!(upstream_url);
    serde_json::from_value(document).unwrap()
}

fn translate(upstream_url: &str) -> Schema {
    oas_translator::translate(&petstore_document(upstream_url), reqwest::Client::new()).unwrap()
}

async fn execute(schema: &Schema, query: &str) -> serde_json::Value {
    let response = schema.execute(query).await;
    assert!(
        response.errors.is_empty(),
        "unexpected errors: {:?}",
        response.errors
    );
    serde_json::to_value(&response.data).unwrap()
}

fn all_pets() -> serde_json::Value {
    json!([
        {"id": 1, "name": "cat", "tag": "cute"},
        {"id": 2, "name": "dog", "tag": "gentle"},
        {"id": 3, "name": "dog2", "tag": "dangerous"},
        {"id": 4, "name": "wolf", "tag": "dangerous"}
    ])
}

#[tokio::test]
async fn finds_all_pets() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(all_pets()))
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(&schema, "{ findPets { id name tag } }").await;

    assert_eq!(data, json!({"findPets": all_pets()}));
}

#[tokio::test]
async fn filters_pets_with_nested_query_parameters() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pets"))
        .and(query_param("tags[0]", "dangerous"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 3, "name": "dog2", "tag": "dangerous"}])),
        )
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(
        &schema,
        r#"{ findPets(limit: 1, tags: ["dangerous"]) { id name tag } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({"findPets": [{"id": 3, "name": "dog2", "tag": "dangerous"}]})
    );
}

#[tokio::test]
async fn finds_a_pet_by_path_parameter() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pets/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "cat", "tag": "cute"})),
        )
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(&schema, "{ findPetById(id: 1) { id } }").await;

    assert_eq!(data, json!({"findPetById": {"id": 1}}));
}

#[tokio::test]
async fn updates_a_pet() {
    let upstream = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/pets/2"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "name", "tag": "tag"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 2, "name": "name", "tag": "tag"})),
        )
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(
        &schema,
        r#"mutation { updatePet(id: 2, newPetInput: {tag: "tag", name: "name"}) { id name tag } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({"updatePet": {"id": 2, "name": "name", "tag": "tag"}})
    );
}

#[tokio::test]
async fn adds_a_pet() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pets"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "newName", "tag": "newTag"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 5, "name": "newName", "tag": "newTag"})),
        )
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(
        &schema,
        r#"mutation { addPet(newPetInput: {tag: "newTag", name: "newName"}) { id name tag } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({"addPet": {"id": 5, "name": "newName", "tag": "newTag"}})
    );
}

#[tokio::test]
async fn resolves_unions_by_property_presence() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/breeds"))
        .and(body_json(json!({"catBreed": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"catBreed": "Sphynx"})))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/breeds"))
        .and(body_json(json!({"dogBreed": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dogBreed": "Labrador"})))
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());

    let data = execute(
        &schema,
        r#"mutation {
            breeds(breedsInput: { catBreed: true }) {
                __typename
                ... on CatMember { catBreed }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data,
        json!({"breeds": {"__typename": "CatMember", "catBreed": "Sphynx"}})
    );

    let data = execute(
        &schema,
        r#"mutation {
            breeds(breedsInput: { dogBreed: true }) {
                __typename
                ... on DogMember { dogBreed }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data,
        json!({"breeds": {"__typename": "DogMember", "dogBreed": "Labrador"}})
    );
}

#[tokio::test]
async fn untyped_responses_pass_through_the_json_scalar() {
    let upstream = MockServer::start().await;
    let body = json!({
        "name": "Pikachu",
        "branch": "ECE",
        "language": "C++",
        "particles": 498,
        "float": 10.5
    });
    Mock::given(method("GET"))
        .and(path("/no-response-schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(&schema, "{ noResponseSchema }").await;

    assert_eq!(data, json!({"noResponseSchema": body}));
}

#[tokio::test]
async fn recursive_parameters_serialize_with_nested_keys() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nestedReferenceInParameter"))
        .and(query_param("russianDoll[name]", "name"))
        .and(query_param("russianDoll[nestedDoll][name]", "name1"))
        .and(query_param("russianDoll[nestedDoll][nestedDoll][name]", "name2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("name,name1,name2"))
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let data = execute(
        &schema,
        r#"{
            nestedReferenceInParameter(russianDoll: {
                name: "name"
                nestedDoll: { name: "name1", nestedDoll: { name: "name2" } }
            })
        }"#,
    )
    .await;

    assert_eq!(data, json!({"nestedReferenceInParameter": "name,name1,name2"}));
}

#[tokio::test]
async fn upstream_errors_surface_as_graphql_errors() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pets/99"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Pet not found"})),
        )
        .mount(&upstream)
        .await;

    let schema = translate(&upstream.uri());
    let response = schema.execute("{ findPetById(id: 99) { id } }").await;

    assert_eq!(response.errors.len(), 1);
    let message = &response.errors[0].message;
    assert!(
        message.contains("StatusCode: 400"),
        "unexpected message: {message}"
    );
    assert!(
        message.contains("Pet not found"),
        "unexpected message: {message}"
    );
    assert_eq!(
        serde_json::to_value(&response.data).unwrap(),
        json!({"findPetById": null})
    );
}

#[tokio::test]
async fn roots_contain_one_field_per_operation() {
    let schema = translate("http://localhost:3000");
    let data = execute(
        &schema,
        "{ __schema { queryType { fields { name } } mutationType { fields { name } } } }",
    )
    .await;

    assert_eq!(
        data,
        json!({
            "__schema": {
                "queryType": {
                    "fields": [
                        {"name": "findPets"},
                        {"name": "findPetById"},
                        {"name": "noResponseSchema"},
                        {"name": "nestedReferenceInParameter"}
                    ]
                },
                "mutationType": {
                    "fields": [
                        {"name": "addPet"},
                        {"name": "updatePet"},
                        {"name": "breeds"}
                    ]
                }
            }
        })
    );
}

#[tokio::test]
async fn the_union_carries_its_members() {
    let schema = translate("http://localhost:3000");
    let data = execute(
        &schema,
        r#"{ __type(name: "BreedsUnion") { kind possibleTypes { name } } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({
            "__type": {
                "kind": "UNION",
                "possibleTypes": [{"name": "CatMember"}, {"name": "DogMember"}]
            }
        })
    );
}

#[tokio::test]
async fn input_and_output_forms_share_the_field_set() {
    let schema = translate("http://localhost:3000");
    let data = execute(
        &schema,
        r#"{
            output: __type(name: "NewPet") { fields { name } }
            input: __type(name: "NewPetInput") { inputFields { name } }
        }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({
            "output": {"fields": [{"name": "name"}, {"name": "tag"}]},
            "input": {"inputFields": [{"name": "name"}, {"name": "tag"}]}
        })
    );
}

#[test]
fn translation_fails_without_a_server_url() {
    let mut document: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/petstore.json")).unwrap();
    document["servers"] = json!([]);
    let document: openapiv3::OpenAPI = serde_json::from_value(document).unwrap();

    let error = oas_translator::translate(&document, reqwest::Client::new()).unwrap_err();
    assert!(matches!(error, oas_translator::Error::MissingServerUrl));
}
