//! Paths of the GitHub REST endpoints used for branch protection.

/// `GET /orgs/{org}/repos`
pub fn org_repositories(organization: &str) -> String {
    format!("/orgs/{}/repos", organization)
}

/// `GET /repos/{org}/{repo}/branches`
pub fn repository_branches(organization: &str, repository: &str) -> String {
    format!("/repos/{}/{}/branches", organization, repository)
}

/// `GET|PUT /repos/{org}/{repo}/branches/{branch}/protection`
pub fn branch_protection(organization: &str, repository: &str, branch: &str) -> String {
    format!(
        "{}/{}/protection",
        repository_branches(organization, repository),
        branch
    )
}

/// `PATCH /repos/{org}/{repo}/branches/{branch}/protection/required_status_checks`
pub fn required_status_checks(organization: &str, repository: &str, branch: &str) -> String {
    format!(
        "{}/required_status_checks",
        branch_protection(organization, repository, branch)
    )
}
