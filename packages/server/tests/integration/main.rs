mod auth;
mod documents;
mod ledger;
