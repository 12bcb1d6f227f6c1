use rocket::Route;

mod auth;
mod election;
mod results;
mod voter;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(voting::routes());
    routes.extend(results::routes());
    routes.extend(election::routes());
    routes.extend(voter::routes());
    routes
}
