use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        id::Id,
        session::WebSession,
        voter::{VoterDescription, VoterSpec},
    },
};

pub fn routes() -> Vec<Route> {
    routes![voters, register_voter, verify_voter, voter_token]
}

#[get("/voters")]
pub fn voters(session: WebSession<'_>) -> Result<Json<Vec<VoterDescription>>> {
    Ok(Json(session.list_voters()?))
}

#[post("/voters", data = "<spec>", format = "json")]
pub fn register_voter(
    session: WebSession<'_>,
    spec: Json<VoterSpec>,
) -> Result<Json<VoterDescription>> {
    Ok(Json(session.register_voter(spec.into_inner())?))
}

#[post("/voters/<voter_id>/verify")]
pub fn verify_voter(session: WebSession<'_>, voter_id: Id) -> Result<Json<VoterDescription>> {
    Ok(Json(session.verify_voter(&voter_id)?))
}

/// The printable token payload, for the print/export renderer.
#[get("/voters/<voter_id>/token")]
pub fn voter_token(session: WebSession<'_>, voter_id: Id) -> Result<String> {
    session.voter_token(&voter_id)
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::model::{roster::Roster, seed::BUDI_TOKEN, store::{MemoryStore, Persisted}};

    use super::*;

    #[backend_test(verifikator)]
    async fn list_hides_passwords(client: Client) {
        let response = client.get(uri!(voters)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let body = response.into_string().await.unwrap();
        assert!(body.contains("andi_pratama"));
        assert!(!body.contains("andi123"));
        assert!(!body.contains("password"));
    }

    #[backend_test(verifikator)]
    async fn register_then_verify(client: Client, store: MemoryStore) {
        let response = client
            .post(uri!(register_voter))
            .header(ContentType::JSON)
            .body(json!(VoterSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let voter: VoterDescription = response.into_json().await.unwrap();
        assert_eq!(Id::from("4"), voter.id);
        assert!(!voter.is_verified);
        assert!(!voter.has_voted);

        let response = client
            .post(uri!(verify_voter(voter_id = voter.id.clone())))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let roster = Roster::load_from(&store).unwrap().unwrap();
        let stored = roster.get(&voter.id).unwrap();
        assert!(stored.is_verified);
        assert_eq!(voter.unique_id, stored.unique_id);
    }

    #[backend_test(verifikator)]
    async fn duplicates_conflict(client: Client) {
        let spec = VoterSpec {
            username: "ANDI_PRATAMA".to_string(),
            ..VoterSpec::example()
        };
        let response = client
            .post(uri!(register_voter))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        let spec = VoterSpec {
            nisn: "1234567890".to_string(),
            ..VoterSpec::example()
        };
        let response = client
            .post(uri!(register_voter))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        let spec = VoterSpec {
            birth_date: "01/08/2006".to_string(),
            ..VoterSpec::example()
        };
        let response = client
            .post(uri!(register_voter))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(verifikator)]
    async fn unknown_voter(client: Client) {
        let response = client
            .post(uri!(verify_voter(voter_id = Id::from("42"))))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(verifikator)]
    async fn token_payload(client: Client) {
        let response = client
            .get(uri!(voter_token(voter_id = Id::from("3"))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(Some(BUDI_TOKEN.to_string()), response.into_string().await);
    }

    #[backend_test(admin)]
    async fn admin_cannot_manage_voters(client: Client) {
        let response = client.get(uri!(voters)).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
        let response = client
            .post(uri!(verify_voter(voter_id = Id::from("2"))))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }
}
