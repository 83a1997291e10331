//! Prompt text for every LLM call.

/// System prompt shared by all calls: the model must answer with JSON only.
pub const JSON_ONLY_SYSTEM: &str = "You are a meticulous résumé editor. \
You answer with a single valid JSON object and nothing else: no prose, no Markdown fences.";

const SCHEMA_TEMPLATE: &str = r#"{
  "name": "Full Name",
  "contact": {
    "email": "email@example.com",
    "linkedin": "linkedin.com/in/username",
    "github": "github.com/username",
    "phone": "(123) 456-7890",
    "location": "Location"
  },
  "summary": "Professional title with X years of experience in field. Expertise in relevant skills and technologies, with a proven track record in specific outcomes or projects.",
  "skills": {
    "skill_category_name_1": ["Skill 1", "Skill 2", "Skill 3"],
    "skill_category_name_2": ["Skill 1", "Skill 2"]
  },
  "experience": [
    {
      "title": "Job Title",
      "company": "Company Name",
      "location": "City, Country",
      "duration": "Start Date - End Date",
      "responsibilities": ["Responsibility 1", "Responsibility 2"]
    }
  ],
  "projects": [
    {
      "name": "Project Name",
      "company": "Company Name",
      "description": "Project description, including key technologies and outcomes."
    }
  ],
  "open_source_contributions": [
    {"project": "Open Source Project Name", "contribution": "Contribution details."}
  ],
  "education": [
    {
      "degree": "Degree Name",
      "institution": "Institution Name",
      "graduation_year": "Graduation Year",
      "relevant_courses": ["Course 1", "Course 2"]
    }
  ],
  "certifications": [
    {"name": "Certification Name", "issued": "Issue Date"}
  ],
  "technical_proficiencies": {
    "proficiency_category_name_1": ["Proficiency 1", "Proficiency 2"]
  },
  "publications_talks": [
    {"title": "Title", "event": "Venue or Event", "year": "Year"}
  ],
  "volunteer_experience": [
    {"organization": "Organization", "role": "Role", "description": "What you did."}
  ],
  "references": "Available upon request."
}"#;

/// Ask the model to map free résumé text onto the canonical schema.
pub fn restructure_prompt(resume_text: &str) -> String {
    format!(
        r#"I have a resume, and I want to extract specific details from it to fill a predefined JSON structure.
For each key in the JSON, find the corresponding data in the resume text. If a key does not have relevant
information in the resume, leave the value empty ("" for text, [] for lists, {{}} for maps) and do not
generate random or placeholder values.

Use as many experience, project, contribution, education, certification, publication and volunteer
entries as the resume contains. Replace the skill and proficiency category names with names that describe
each group (snake_case).

Below is the JSON structure I need to fill:

{schema}

Here is the resume text:
[{resume_text}]

Important: do not miss any information. Keep as much of the original content as you can.
Give the output in JSON format only and do not add anything except the JSON to the output."#,
        schema = SCHEMA_TEMPLATE,
        resume_text = resume_text.trim(),
    )
}

/// Ask the model to rewrite résumé values toward a job description without
/// touching the structure.
pub fn regenerate_prompt(job_description: &str, resume_json: &str) -> String {
    format!(
        r#"You are given a resume in JSON format and a job description. Your task is to update the resume to make
it as relevant as possible to the job description while strictly preserving the structure of the JSON.

Instructions:
1. Rephrase, expand, and optimize the content within the JSON to reflect the skills, qualifications, and
   experiences that align with the job description.
2. Where appropriate, add details, achievements, and relevant context that would make the candidate stand
   out for the job.
3. Ensure the JSON structure remains completely intact. The keys, nested objects, arrays, and their
   structure must not be changed. Only modify the values where necessary.
4. Do not fabricate any facts. All changes must be plausible improvements of the existing information.
5. Focus on aligning the resume with the job responsibilities, required qualifications, and desired
   skills described in the job description.

Resume JSON:
{resume_json}

Job Description:
{job_description}

Return only the updated resume JSON."#,
        resume_json = resume_json,
        job_description = job_description.trim(),
    )
}

/// Ask the model for a seven-aspect fit assessment.
pub fn assessment_prompt(resume_text: &str, job_description: &str) -> String {
    format!(
        r#"AIM
---
Calculate the score of the candidate's resume for the corresponding job description.

INPUTS
------
Candidate's Resume: [{resume_text}]
Job Description: [{job_description}]

SCORE CALCULATION
-----------------
Keyword Matching Score:
Identify the keywords and phrases in the job description that reflect required skills, qualifications
and experiences. Count how many appear in the resume and express the matched percentage as a score
between 1 and 100, both inclusive.

Skills Matching Score:
Examine the skills listed in the job description and check whether the resume shows evidence of them.
Weight skills by importance to the role and give a weighted percentage between 1 and 100.

Qualifications Matching Score:
Examine the qualifications listed in the job description and check whether the resume shows evidence of
them. Weight them by importance and give a weighted percentage between 1 and 100.

Experience Alignment Score:
Compare past roles, responsibilities and achievements with those in the job description. Assess relevance
and depth and quantify the alignment between 1 and 100.

Education and Certifications Alignment Score:
Check whether education and certifications meet the stated requirements, weighted by importance, and give
a percentage between 1 and 100.

Soft Skills and Personal Attributes Score:
Look for explicit evidence of communication, teamwork, leadership, adaptability and cultural fit. Give a
score between 1 and 100.

Overall Fit Score:
Combine the scores above, weighted by their importance to the role, into a score between 1 and 100.

OUTPUT
------
Return exactly this JSON object with numeric values:
{{
  "Keyword_Matching_Score": 0,
  "Skills_Matching_Score": 0,
  "Qualifications_Matching_Score": 0,
  "Experience_Alignment_Score": 0,
  "Education_and_Certifications_Alignment_Score": 0,
  "Soft_Skills_and_Personal_Attributes_Score": 0,
  "Overall_Fit_Score": 0
}}"#,
        resume_text = resume_text.trim(),
        job_description = job_description.trim(),
    )
}
